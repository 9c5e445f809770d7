//! Port for diary persistence, including the photo promotion unit of work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};

use crate::domain::{Diary, DiaryId, Photo, UploadSessionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by diary repository adapters.
    pub enum DiaryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "diary repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "diary repository query failed: {message}",
        /// The upload session was not pending and unexpired when claimed.
        SessionUnavailable => "upload session is no longer pending",
        /// Copying a staged object into permanent storage failed.
        Storage { message: String } => "photo promotion storage step failed: {message}",
    }
}

/// Diary created together with its promoted photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedDiary {
    /// The stored diary with photos in display order.
    pub diary: Diary,
    /// Staging keys that are now safe to delete.
    pub staging_keys: Vec<String>,
}

/// Port for ownership-scoped diary storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiaryRepository: Send + Sync {
    /// Insert a diary without photos.
    async fn create(&self, diary: &Diary) -> Result<(), DiaryRepositoryError>;

    /// Atomically claim `upload_id`, insert `diary`, promote every staged
    /// file in staging order and drop the temp rows.
    ///
    /// Implementations roll everything back on any failure, leaving the
    /// session pending. The claim must fail with `SessionUnavailable` when
    /// the session is not pending, belongs to someone else or has expired at
    /// `now`.
    async fn create_with_promotion(
        &self,
        diary: &Diary,
        upload_id: UploadSessionId,
        now: DateTime<Utc>,
    ) -> Result<PromotedDiary, DiaryRepositoryError>;

    /// Fetch a diary with photos when owned by `user_id`.
    async fn find_for_user(
        &self,
        diary_id: DiaryId,
        user_id: &UserId,
    ) -> Result<Option<Diary>, DiaryRepositoryError>;

    /// Page through a user's diaries, newest logical date first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Diary>, DiaryRepositoryError>;

    /// Persist title, content, date and `updated_at`; `false` when missing.
    async fn update(&self, diary: &Diary) -> Result<bool, DiaryRepositoryError>;

    /// Delete a diary and its photos; returns the removed photos, or `None`
    /// when the diary does not exist for `user_id`.
    async fn delete_for_user(
        &self,
        diary_id: DiaryId,
        user_id: &UserId,
    ) -> Result<Option<Vec<Photo>>, DiaryRepositoryError>;
}
