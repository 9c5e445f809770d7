//! S3-compatible object store adapter.
//!
//! A custom endpoint switches the client to path-style addressing so
//! MinIO and similar stores work without virtual-host DNS.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use tracing::debug;

use crate::domain::ports::{ObjectMetadata, ObjectStore, ObjectStoreError, PresignedUpload};

/// `DeleteObjects` accepts at most this many keys per request.
const DELETE_BATCH: usize = 1000;

/// Connection settings for [`S3ObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

/// [`ObjectStore`] backed by a single S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from the ambient AWS credential chain.
    pub async fn connect(settings: &S3Settings) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Transport failures become `Unavailable`; everything else is an operation error.
fn map_sdk_error<E, R>(operation: &str, error: SdkError<E, R>) -> ObjectStoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{operation}: {}", DisplayErrorContext(&error));
    debug!(%message, "object store call failed");
    match error {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            ObjectStoreError::unavailable(message)
        }
        _ => ObjectStoreError::operation(message),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, ObjectStoreError> {
        let config = PresigningConfig::expires_in(ttl)
            .map_err(|err| ObjectStoreError::operation(format!("presign config: {err}")))?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(config)
            .await
            .map_err(|err| map_sdk_error("presign put", err))?;
        Ok(PresignedUpload {
            url: request.uri().to_owned(),
        })
    }

    async fn put(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), ObjectStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|err| map_sdk_error("put object", err))
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMetadata>, ObjectStoreError> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;
        let object = match response {
            Ok(object) => object,
            Err(SdkError::ServiceError(error)) if error.err().is_not_found() => return Ok(None),
            Err(err) => return Err(map_sdk_error("head object", err)),
        };
        let size_bytes = object
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| {
                ObjectStoreError::operation(format!("head object {key}: missing content length"))
            })?;
        Ok(Some(ObjectMetadata {
            size_bytes,
            content_type: object.content_type().map(ToOwned::to_owned),
        }))
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let response = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(format!("{}/{from}", self.bucket))
            .key(to)
            .send()
            .await;
        match response {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(error)) if error.raw().status().as_u16() == 404 => {
                Err(ObjectStoreError::not_found(from))
            }
            Err(err) => Err(map_sdk_error("copy object", err)),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), ObjectStoreError> {
        for batch in keys.chunks(DELETE_BATCH) {
            let identifiers = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| ObjectStoreError::operation(format!("delete request: {err}")))?;
            let delete = Delete::builder()
                .set_objects(Some(identifiers))
                .quiet(true)
                .build()
                .map_err(|err| ObjectStoreError::operation(format!("delete request: {err}")))?;

            let response = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|err| map_sdk_error("delete objects", err))?;

            if let Some(first) = response.errors().first() {
                return Err(ObjectStoreError::operation(format!(
                    "delete objects: {} of {} keys failed, first {:?}: {:?}",
                    response.errors().len(),
                    batch.len(),
                    first.key(),
                    first.message()
                )));
            }
        }
        Ok(())
    }
}
