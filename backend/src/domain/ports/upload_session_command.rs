//! Driving port for upload session mutations.
//!
//! Sessions hand out presigned staging targets; confirmations and direct
//! uploads turn landed objects into staged temp photos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, TempPhoto, UploadSession, UploadSessionId, UploadTarget, UserId};

/// Request to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUploadSessionRequest {
    pub user_id: UserId,
    pub file_count: u8,
    pub file_names: Vec<String>,
}

/// Staging target paired with its presigned upload URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedTarget {
    pub target: UploadTarget,
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Newly opened session and one presigned target per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedUploadSession {
    pub session: UploadSession,
    pub targets: Vec<PresignedTarget>,
}

/// Client notice that a presigned PUT completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmUploadRequest {
    pub user_id: UserId,
    pub upload_id: UploadSessionId,
    pub file_id: String,
    pub staging_key: String,
    pub size_bytes: i64,
    pub mime_type: String,
}

/// File bytes sent through the API instead of a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectUploadRequest {
    pub user_id: UserId,
    pub upload_id: UploadSessionId,
    pub index: u8,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Domain use-case port for upload sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadSessionCommand: Send + Sync {
    /// Open a session and presign one staging key per slot.
    async fn create_session(
        &self,
        request: CreateUploadSessionRequest,
    ) -> Result<CreatedUploadSession, Error>;

    /// Record a file uploaded through a presigned URL.
    async fn confirm_upload(&self, request: ConfirmUploadRequest) -> Result<TempPhoto, Error>;

    /// Store the bytes at the slot's staging key and record the file.
    async fn upload_file(&self, request: DirectUploadRequest) -> Result<TempPhoto, Error>;
}
