//! Diary domain service: ownership-scoped CRUD plus photo promotion.
//!
//! Promotion runs in two phases. The repository commits the claim, diary,
//! photos and temp-row cleanup as one unit; afterwards the service deletes
//! the staging objects on a best-effort basis.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageRequest, Paginated};
use tracing::{info, warn};

use crate::domain::ports::{
    CreateDiaryRequest, DiaryCommand, DiaryQuery, DiaryRepository, DiaryRepositoryError,
    ObjectStore, UploadSessionRepository,
};
use crate::domain::upload_session_service::map_session_repository_error;
use crate::domain::{
    Diary, DiaryChanges, DiaryId, Error, UploadSessionId, UploadStatus, UserId,
};

/// Diary service implementing the command and query ports.
#[derive(Clone)]
pub struct DiaryService<D, S> {
    diaries: Arc<D>,
    sessions: Arc<S>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
}

impl<D, S> DiaryService<D, S> {
    /// Create a new service from its repositories, object store and clock.
    pub fn new(
        diaries: Arc<D>,
        sessions: Arc<S>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            diaries,
            sessions,
            store,
            clock,
        }
    }
}

fn map_diary_repository_error(error: DiaryRepositoryError) -> Error {
    match error {
        DiaryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("diary repository unavailable: {message}"))
        }
        DiaryRepositoryError::Query { message } => {
            Error::internal(format!("diary repository error: {message}"))
        }
        DiaryRepositoryError::SessionUnavailable => {
            Error::invalid_upload_session("upload session is no longer pending")
        }
        DiaryRepositoryError::Storage { message } => {
            Error::internal(format!("photo promotion failed: {message}"))
        }
    }
}

impl<D, S> DiaryService<D, S>
where
    D: DiaryRepository,
    S: UploadSessionRepository,
{
    /// Fail fast on sessions that cannot be promoted.
    ///
    /// The repository re-checks the same conditions in its claim, so a race
    /// between this check and the commit still cannot promote twice.
    async fn ensure_promotable(
        &self,
        user_id: &UserId,
        upload_id: UploadSessionId,
    ) -> Result<(), Error> {
        let session = self
            .sessions
            .find_for_user(upload_id, user_id)
            .await
            .map_err(map_session_repository_error)?
            .filter(|session| session.status() == UploadStatus::Pending)
            .ok_or_else(|| Error::invalid_upload_session("upload session not found or already used"))?;
        if session.is_expired(self.clock.utc()) {
            return Err(Error::upload_session_expired("upload session has expired"));
        }
        Ok(())
    }

    async fn discard_objects(&self, keys: Vec<String>, reason: &'static str) {
        if keys.is_empty() {
            return;
        }
        if let Err(err) = self.store.delete_many(&keys).await {
            warn!(error = %err, count = keys.len(), reason, "object cleanup failed");
        }
    }

    async fn promote(&self, diary: Diary, upload_id: UploadSessionId) -> Result<Diary, Error> {
        self.ensure_promotable(diary.user_id(), upload_id).await?;
        let promoted = match self
            .diaries
            .create_with_promotion(&diary, upload_id, self.clock.utc())
            .await
        {
            Ok(promoted) => promoted,
            // The session changed after the pre-check; re-read it so expiry
            // still reports as Gone rather than as an invalid session.
            Err(DiaryRepositoryError::SessionUnavailable) => {
                self.ensure_promotable(diary.user_id(), upload_id).await?;
                return Err(map_diary_repository_error(
                    DiaryRepositoryError::SessionUnavailable,
                ));
            }
            Err(err) => return Err(map_diary_repository_error(err)),
        };
        info!(
            diary_id = %promoted.diary.id(),
            %upload_id,
            photos = promoted.diary.photos().len(),
            "upload session promoted"
        );
        self.discard_objects(promoted.staging_keys, "staging").await;
        Ok(promoted.diary)
    }
}

#[async_trait]
impl<D, S> DiaryCommand for DiaryService<D, S>
where
    D: DiaryRepository,
    S: UploadSessionRepository,
{
    async fn create_diary(&self, request: CreateDiaryRequest) -> Result<Diary, Error> {
        let CreateDiaryRequest {
            user_id,
            draft,
            upload_id,
        } = request;
        let diary = Diary::create(user_id, draft, self.clock.utc());
        match upload_id {
            Some(upload_id) => self.promote(diary, upload_id).await,
            None => {
                self.diaries
                    .create(&diary)
                    .await
                    .map_err(map_diary_repository_error)?;
                Ok(diary)
            }
        }
    }

    async fn update_diary(
        &self,
        user_id: &UserId,
        diary_id: DiaryId,
        changes: DiaryChanges,
    ) -> Result<Diary, Error> {
        let mut diary = self
            .diaries
            .find_for_user(diary_id, user_id)
            .await
            .map_err(map_diary_repository_error)?
            .ok_or_else(|| Error::not_found("diary not found"))?;
        diary.apply(changes, self.clock.utc());
        let updated = self
            .diaries
            .update(&diary)
            .await
            .map_err(map_diary_repository_error)?;
        if !updated {
            return Err(Error::not_found("diary not found"));
        }
        Ok(diary)
    }

    async fn delete_diary(&self, user_id: &UserId, diary_id: DiaryId) -> Result<(), Error> {
        let photos = self
            .diaries
            .delete_for_user(diary_id, user_id)
            .await
            .map_err(map_diary_repository_error)?
            .ok_or_else(|| Error::not_found("diary not found"))?;

        let mut keys: Vec<String> = photos
            .into_iter()
            .flat_map(|photo| [photo.storage_key, photo.thumbnail_key])
            .collect();
        keys.sort();
        keys.dedup();
        info!(%diary_id, objects = keys.len(), "diary deleted");
        self.discard_objects(keys, "diary deleted").await;
        Ok(())
    }
}

#[async_trait]
impl<D, S> DiaryQuery for DiaryService<D, S>
where
    D: DiaryRepository,
    S: UploadSessionRepository,
{
    async fn list_diaries(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Diary>, Error> {
        self.diaries
            .list_for_user(user_id, page)
            .await
            .map_err(map_diary_repository_error)
    }

    async fn get_diary(&self, user_id: &UserId, diary_id: DiaryId) -> Result<Diary, Error> {
        self.diaries
            .find_for_user(diary_id, user_id)
            .await
            .map_err(map_diary_repository_error)?
            .ok_or_else(|| Error::not_found("diary not found"))
    }
}

#[cfg(test)]
#[path = "diary_service_tests.rs"]
mod tests;
