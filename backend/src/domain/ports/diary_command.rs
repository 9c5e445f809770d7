//! Driving port for diary mutations.

use async_trait::async_trait;

use crate::domain::{Diary, DiaryChanges, DiaryDraft, DiaryId, Error, UploadSessionId, UserId};

/// Request to create a diary, optionally promoting an upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDiaryRequest {
    pub user_id: UserId,
    pub draft: DiaryDraft,
    pub upload_id: Option<UploadSessionId>,
}

/// Domain use-case port for diary writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiaryCommand: Send + Sync {
    /// Create a diary; with an upload id, staged photos are promoted.
    async fn create_diary(&self, request: CreateDiaryRequest) -> Result<Diary, Error>;

    /// Apply a partial update to an owned diary.
    async fn update_diary(
        &self,
        user_id: &UserId,
        diary_id: DiaryId,
        changes: DiaryChanges,
    ) -> Result<Diary, Error>;

    /// Delete an owned diary and its photos.
    async fn delete_diary(&self, user_id: &UserId, diary_id: DiaryId) -> Result<(), Error>;
}
