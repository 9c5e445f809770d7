//! Port for upload session and staged photo persistence.

use async_trait::async_trait;

use crate::domain::{TempPhoto, UploadSession, UploadSessionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by upload session repository adapters.
    pub enum UploadSessionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "upload session repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "upload session repository query failed: {message}",
        /// The file id was already confirmed for the session.
        DuplicateFile { file_id: String } => "file already staged: {file_id}",
    }
}

/// Port for upload sessions and their staged files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadSessionRepository: Send + Sync {
    /// Persist a new session.
    async fn create(&self, session: &UploadSession) -> Result<(), UploadSessionRepositoryError>;

    /// Fetch a session owned by `user_id`, whatever its status.
    async fn find_for_user(
        &self,
        upload_id: UploadSessionId,
        user_id: &UserId,
    ) -> Result<Option<UploadSession>, UploadSessionRepositoryError>;

    /// Staged files ordered by staging index, then confirmation time.
    async fn list_temp_photos(
        &self,
        upload_id: UploadSessionId,
    ) -> Result<Vec<TempPhoto>, UploadSessionRepositoryError>;

    /// Record a staged file.
    async fn add_temp_photo(&self, photo: &TempPhoto) -> Result<(), UploadSessionRepositoryError>;
}
