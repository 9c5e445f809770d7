//! Driving port for diary reads.

use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{Diary, DiaryId, Error, UserId};

/// Domain use-case port for listing and fetching diaries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiaryQuery: Send + Sync {
    /// Page through the caller's diaries, newest date first.
    async fn list_diaries(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Diary>, Error>;

    /// Fetch one owned diary with photos.
    async fn get_diary(&self, user_id: &UserId, diary_id: DiaryId) -> Result<Diary, Error>;
}
