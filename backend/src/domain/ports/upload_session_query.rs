//! Driving port for reading upload session state.

use async_trait::async_trait;

use crate::domain::{Error, UploadSessionId, UploadSessionSnapshot, UserId};

/// Domain use-case port for session inspection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadSessionQuery: Send + Sync {
    /// Load a session owned by `user_id` with its effective status.
    async fn get_session(
        &self,
        user_id: &UserId,
        upload_id: UploadSessionId,
    ) -> Result<UploadSessionSnapshot, Error>;
}
