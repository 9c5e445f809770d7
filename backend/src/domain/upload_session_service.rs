//! Upload session domain service.
//!
//! Opens sessions with presigned staging targets and records staged files,
//! either confirmed after a presigned PUT or written through the API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{
    ConfirmUploadRequest, CreateUploadSessionRequest, CreatedUploadSession, DirectUploadRequest,
    ObjectStore, ObjectStoreError, PresignedTarget, UploadSessionCommand, UploadSessionQuery,
    UploadSessionRepository, UploadSessionRepositoryError,
};
use crate::domain::{
    Error, ImageMimeType, MAX_DIRECT_UPLOAD_BYTES, PRESIGNED_UPLOAD_TTL, TempPhoto,
    UploadSession, UploadSessionId, UploadSessionSnapshot, UploadStatus, UploadValidationError,
    UserId, staged_file_id, staging_key,
};

/// Upload session service implementing the command and query ports.
#[derive(Clone)]
pub struct UploadSessionService<R> {
    sessions: Arc<R>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
}

impl<R> UploadSessionService<R> {
    /// Create a new service over a session repository and object store.
    pub fn new(sessions: Arc<R>, store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions,
            store,
            clock,
        }
    }
}

pub(crate) fn map_session_repository_error(error: UploadSessionRepositoryError) -> Error {
    match error {
        UploadSessionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("upload session repository unavailable: {message}"))
        }
        UploadSessionRepositoryError::Query { message } => {
            Error::internal(format!("upload session repository error: {message}"))
        }
        UploadSessionRepositoryError::DuplicateFile { file_id } => {
            Error::conflict(format!("file {file_id} was already uploaded"))
        }
    }
}

pub(crate) fn map_object_store_error(error: ObjectStoreError) -> Error {
    match error {
        ObjectStoreError::Unavailable { message } => {
            Error::service_unavailable(format!("object store unavailable: {message}"))
        }
        other => Error::internal(format!("object store error: {other}")),
    }
}

fn upload_validation_error(error: UploadValidationError) -> Error {
    Error::validation(error.to_string()).with_details(json!({ "field": error.field() }))
}

/// Reject sessions that can no longer accept files.
fn ensure_accepts_files(session: &UploadSession, now: DateTime<Utc>) -> Result<(), Error> {
    match session.effective_status(now) {
        UploadStatus::Pending => Ok(()),
        UploadStatus::Completed => Err(Error::invalid_upload_session(
            "upload session has already been used",
        )),
        UploadStatus::Expired => Err(Error::upload_session_expired("upload session has expired")),
    }
}

impl<R> UploadSessionService<R>
where
    R: UploadSessionRepository,
{
    async fn load_owned(
        &self,
        user_id: &UserId,
        upload_id: UploadSessionId,
    ) -> Result<UploadSession, Error> {
        self.sessions
            .find_for_user(upload_id, user_id)
            .await
            .map_err(map_session_repository_error)?
            .ok_or_else(|| Error::not_found("upload session not found"))
    }

    async fn record(&self, photo: TempPhoto) -> Result<TempPhoto, Error> {
        self.sessions
            .add_temp_photo(&photo)
            .await
            .map_err(map_session_repository_error)?;
        debug!(upload_id = %photo.upload_id, file_id = %photo.file_id, "file staged");
        Ok(photo)
    }
}

#[async_trait]
impl<R> UploadSessionCommand for UploadSessionService<R>
where
    R: UploadSessionRepository,
{
    async fn create_session(
        &self,
        request: CreateUploadSessionRequest,
    ) -> Result<CreatedUploadSession, Error> {
        let CreateUploadSessionRequest {
            user_id,
            file_count,
            file_names,
        } = request;
        let now = self.clock.utc();
        let session =
            UploadSession::open(user_id, file_count, now).map_err(upload_validation_error)?;
        let targets = session
            .plan_targets(&file_names)
            .map_err(upload_validation_error)?;

        let url_expires_at = now
            + TimeDelta::from_std(PRESIGNED_UPLOAD_TTL)
                .map_err(|err| Error::internal(format!("invalid presign ttl: {err}")))?;
        let mut presigned = Vec::with_capacity(targets.len());
        for target in targets {
            let upload = self
                .store
                .presign_put(&target.staging_key, target.content_type, PRESIGNED_UPLOAD_TTL)
                .await
                .map_err(map_object_store_error)?;
            presigned.push(PresignedTarget {
                target,
                upload_url: upload.url,
                expires_at: url_expires_at,
            });
        }

        self.sessions
            .create(&session)
            .await
            .map_err(map_session_repository_error)?;
        debug!(upload_id = %session.id(), file_count, "upload session opened");
        Ok(CreatedUploadSession {
            session,
            targets: presigned,
        })
    }

    async fn confirm_upload(&self, request: ConfirmUploadRequest) -> Result<TempPhoto, Error> {
        let ConfirmUploadRequest {
            user_id,
            upload_id,
            file_id,
            staging_key,
            size_bytes,
            mime_type,
        } = request;
        let mime_type: ImageMimeType = mime_type.parse().map_err(upload_validation_error)?;
        if size_bytes < 1 {
            return Err(upload_validation_error(UploadValidationError::EmptyFile));
        }

        let now = self.clock.utc();
        let session = self.load_owned(&user_id, upload_id).await?;
        ensure_accepts_files(&session, now)?;
        let staging_index = session
            .slot_for_file_id(&file_id)
            .map_err(upload_validation_error)?;
        session
            .check_staging_key(&file_id, &staging_key)
            .map_err(upload_validation_error)?;

        let Some(landed) = self
            .store
            .head(&staging_key)
            .await
            .map_err(map_object_store_error)?
        else {
            return Err(Error::validation("file has not been uploaded to its staging key")
                .with_details(json!({ "field": "filePath" })));
        };
        if landed.size_bytes == 0 {
            return Err(upload_validation_error(UploadValidationError::EmptyFile));
        }

        self.record(TempPhoto {
            upload_id,
            file_id,
            staging_index,
            staging_key,
            size_bytes: landed.size_bytes,
            mime_type,
            created_at: now,
        })
        .await
    }

    async fn upload_file(&self, request: DirectUploadRequest) -> Result<TempPhoto, Error> {
        let DirectUploadRequest {
            user_id,
            upload_id,
            index,
            content_type,
            bytes,
        } = request;
        let mime_type: ImageMimeType = content_type.parse().map_err(upload_validation_error)?;
        if bytes.is_empty() {
            return Err(upload_validation_error(UploadValidationError::EmptyFile));
        }
        let size_bytes = u64::try_from(bytes.len())
            .map_err(|err| Error::internal(format!("upload size overflow: {err}")))?;
        if size_bytes > MAX_DIRECT_UPLOAD_BYTES {
            return Err(upload_validation_error(
                UploadValidationError::FileTooLarge {
                    max: MAX_DIRECT_UPLOAD_BYTES,
                },
            ));
        }

        let now = self.clock.utc();
        let session = self.load_owned(&user_id, upload_id).await?;
        ensure_accepts_files(&session, now)?;
        if index >= session.file_count() {
            return Err(upload_validation_error(
                UploadValidationError::IndexOutOfRange {
                    index,
                    file_count: session.file_count(),
                },
            ));
        }

        let file_id = staged_file_id(upload_id, index);
        let already_staged = self
            .sessions
            .list_temp_photos(upload_id)
            .await
            .map_err(map_session_repository_error)?
            .iter()
            .any(|photo| photo.file_id == file_id);
        if already_staged {
            return Err(Error::conflict(format!("file {file_id} was already uploaded")));
        }

        let key = staging_key(session.user_id(), upload_id, index, mime_type.extension());
        self.store
            .put(&key, mime_type.as_str(), bytes)
            .await
            .map_err(map_object_store_error)?;

        self.record(TempPhoto {
            upload_id,
            file_id,
            staging_index: index,
            staging_key: key,
            size_bytes,
            mime_type,
            created_at: now,
        })
        .await
    }
}

#[async_trait]
impl<R> UploadSessionQuery for UploadSessionService<R>
where
    R: UploadSessionRepository,
{
    async fn get_session(
        &self,
        user_id: &UserId,
        upload_id: UploadSessionId,
    ) -> Result<UploadSessionSnapshot, Error> {
        let session = self.load_owned(user_id, upload_id).await?;
        let temp_photos = self
            .sessions
            .list_temp_photos(upload_id)
            .await
            .map_err(map_session_repository_error)?;
        let status = session.effective_status(self.clock.utc());
        Ok(UploadSessionSnapshot {
            session,
            status,
            temp_photos,
        })
    }
}

#[cfg(test)]
#[path = "upload_session_service_tests.rs"]
mod tests;
