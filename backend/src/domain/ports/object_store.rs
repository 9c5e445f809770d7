//! Object Store Gateway port: bucket-style blob operations.
//!
//! Keys are bucket-relative paths such as `uploads/{user}/{session}/...`.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by object store adapters.
    pub enum ObjectStoreError {
        /// The store could not be reached.
        Unavailable { message: String } => "object store unavailable: {message}",
        /// The source object does not exist.
        NotFound { key: String } => "object not found: {key}",
        /// The store rejected or failed the operation.
        Operation { message: String } => "object store operation failed: {message}",
    }
}

/// Time-limited write credential for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUpload {
    pub url: String,
}

/// Stored object metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// Bucket-based object storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presign a PUT of `key` valid for `ttl`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, ObjectStoreError>;

    /// Write `body` to `key`, replacing any existing object.
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>)
    -> Result<(), ObjectStoreError>;

    /// Fetch metadata for `key`; `None` when absent.
    async fn head(&self, key: &str) -> Result<Option<ObjectMetadata>, ObjectStoreError>;

    /// Server-side copy of `from` to `to`.
    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError>;

    /// Delete every key in `keys`; missing keys are not an error.
    async fn delete_many(&self, keys: &[String]) -> Result<(), ObjectStoreError>;
}
