//! In-memory repository adapters.
//!
//! Used when no database is configured and by integration tests. All three
//! repositories share one [`InMemoryDatabase`] so promotion can claim a
//! session, move staged photos and insert the diary under a single lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{PageRequest, Paginated};
use tokio::sync::Mutex;

use crate::domain::ports::{
    DiaryRepository, DiaryRepositoryError, ObjectStore, PromotedDiary, UploadSessionRepository,
    UploadSessionRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Diary, DiaryId, Email, Photo, TempPhoto, UploadSession, UploadSessionId, UploadStatus, UserAccount,
    UserId, plan_promotion,
};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, UserAccount>,
    sessions: HashMap<UploadSessionId, UploadSession>,
    temp_photos: HashMap<UploadSessionId, Vec<TempPhoto>>,
    diaries: HashMap<DiaryId, Diary>,
}

/// Shared backing store for the in-memory repositories.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository { db: self.clone() }
    }

    pub fn upload_sessions(&self) -> InMemoryUploadSessionRepository {
        InMemoryUploadSessionRepository { db: self.clone() }
    }

    /// Diary repository copying promoted objects through `store`.
    pub fn diaries(&self, store: Arc<dyn ObjectStore>) -> InMemoryDiaryRepository {
        InMemoryDiaryRepository {
            db: self.clone(),
            store,
        }
    }
}

/// In-memory [`UserRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserRepositoryError> {
        let mut state = self.db.state.lock().await;
        let email = account.user.email().as_ref().to_owned();
        if state.accounts.contains_key(&email) {
            return Err(UserRepositoryError::duplicate_email(email));
        }
        state.accounts.insert(email, account.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        let state = self.db.state.lock().await;
        Ok(state.accounts.get(email.as_ref()).cloned())
    }
}

/// In-memory [`UploadSessionRepository`].
#[derive(Debug, Clone)]
pub struct InMemoryUploadSessionRepository {
    db: InMemoryDatabase,
}

#[async_trait]
impl UploadSessionRepository for InMemoryUploadSessionRepository {
    async fn create(&self, session: &UploadSession) -> Result<(), UploadSessionRepositoryError> {
        let mut state = self.db.state.lock().await;
        state.sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn find_for_user(
        &self,
        upload_id: UploadSessionId,
        user_id: &UserId,
    ) -> Result<Option<UploadSession>, UploadSessionRepositoryError> {
        let state = self.db.state.lock().await;
        Ok(state
            .sessions
            .get(&upload_id)
            .filter(|session| session.user_id() == user_id)
            .cloned())
    }

    async fn list_temp_photos(
        &self,
        upload_id: UploadSessionId,
    ) -> Result<Vec<TempPhoto>, UploadSessionRepositoryError> {
        let state = self.db.state.lock().await;
        let mut photos = state.temp_photos.get(&upload_id).cloned().unwrap_or_default();
        photos.sort_by(|a, b| {
            a.staging_index
                .cmp(&b.staging_index)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(photos)
    }

    async fn add_temp_photo(&self, photo: &TempPhoto) -> Result<(), UploadSessionRepositoryError> {
        let mut state = self.db.state.lock().await;
        if !state.sessions.contains_key(&photo.upload_id) {
            return Err(UploadSessionRepositoryError::query(format!(
                "unknown upload session {}",
                photo.upload_id
            )));
        }
        let staged = state.temp_photos.entry(photo.upload_id).or_default();
        if staged.iter().any(|existing| existing.file_id == photo.file_id) {
            return Err(UploadSessionRepositoryError::duplicate_file(
                photo.file_id.as_str(),
            ));
        }
        staged.push(photo.clone());
        Ok(())
    }
}

/// In-memory [`DiaryRepository`].
#[derive(Clone)]
pub struct InMemoryDiaryRepository {
    db: InMemoryDatabase,
    store: Arc<dyn ObjectStore>,
}

fn is_claimable(session: &UploadSession, user_id: &UserId, now: DateTime<Utc>) -> bool {
    session.user_id() == user_id
        && session.status() == UploadStatus::Pending
        && !session.is_expired(now)
}

#[async_trait]
impl DiaryRepository for InMemoryDiaryRepository {
    async fn create(&self, diary: &Diary) -> Result<(), DiaryRepositoryError> {
        let mut state = self.db.state.lock().await;
        state.diaries.insert(diary.id(), diary.clone());
        Ok(())
    }

    async fn create_with_promotion(
        &self,
        diary: &Diary,
        upload_id: UploadSessionId,
        now: DateTime<Utc>,
    ) -> Result<PromotedDiary, DiaryRepositoryError> {
        // The lock is held across the copies so a concurrent claim waits and
        // then observes the completed session.
        let mut state = self.db.state.lock().await;
        let mut session = state
            .sessions
            .get(&upload_id)
            .filter(|session| is_claimable(session, diary.user_id(), now))
            .cloned()
            .ok_or_else(DiaryRepositoryError::session_unavailable)?;

        let staged = state.temp_photos.get(&upload_id).cloned().unwrap_or_default();
        let plan = plan_promotion(diary, staged, now);
        for step in &plan {
            self.store
                .copy(&step.staging_key, &step.photo.storage_key)
                .await
                .map_err(|err| DiaryRepositoryError::storage(err.to_string()))?;
        }

        session.mark_completed(now);
        state.sessions.insert(upload_id, session);
        state.temp_photos.remove(&upload_id);

        let mut staging_keys = Vec::with_capacity(plan.len());
        let mut promoted = Vec::with_capacity(plan.len());
        for step in plan {
            staging_keys.push(step.staging_key);
            promoted.push(step.photo);
        }
        let diary = diary.clone().with_photos(promoted);
        state.diaries.insert(diary.id(), diary.clone());

        Ok(PromotedDiary {
            diary,
            staging_keys,
        })
    }

    async fn find_for_user(
        &self,
        diary_id: DiaryId,
        user_id: &UserId,
    ) -> Result<Option<Diary>, DiaryRepositoryError> {
        let state = self.db.state.lock().await;
        Ok(state
            .diaries
            .get(&diary_id)
            .filter(|diary| diary.user_id() == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Diary>, DiaryRepositoryError> {
        let state = self.db.state.lock().await;
        let mut owned: Vec<&Diary> = state
            .diaries
            .values()
            .filter(|diary| diary.user_id() == user_id)
            .collect();
        owned.sort_by(|a, b| {
            b.date()
                .cmp(&a.date())
                .then(b.created_at().cmp(&a.created_at()))
                .then(a.id().as_uuid().cmp(b.id().as_uuid()))
        });

        let total = owned.len() as u64;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = owned
            .into_iter()
            .skip(skip)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(Paginated::new(items, page, total))
    }

    async fn update(&self, diary: &Diary) -> Result<bool, DiaryRepositoryError> {
        let mut state = self.db.state.lock().await;
        match state.diaries.get_mut(&diary.id()) {
            Some(stored) if stored.user_id() == diary.user_id() => {
                let photos = stored.photos().to_vec();
                *stored = diary.clone().with_photos(photos);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_for_user(
        &self,
        diary_id: DiaryId,
        user_id: &UserId,
    ) -> Result<Option<Vec<Photo>>, DiaryRepositoryError> {
        let mut state = self.db.state.lock().await;
        let owned = state
            .diaries
            .get(&diary_id)
            .is_some_and(|diary| diary.user_id() == user_id);
        if !owned {
            return Ok(None);
        }
        Ok(state
            .diaries
            .remove(&diary_id)
            .map(|diary| diary.photos().to_vec()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
