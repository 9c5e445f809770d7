//! PostgreSQL-backed `DiaryRepository` implementation using Diesel ORM.
//!
//! Diary creation with photo promotion runs as one transaction: the upload
//! session is claimed with a conditional update, staged files are copied to
//! their permanent keys and recorded, and the staging rows are removed. Any
//! failure rolls the whole unit back, so the session stays pending and no
//! diary or photo rows survive.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{PageRequest, Paginated};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{DiaryRepository, DiaryRepositoryError, ObjectStore, PromotedDiary};
use crate::domain::{
    Diary, DiaryId, Photo, UploadSessionId, UploadStatus, UserId, plan_promotion,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    DiaryRow, DiaryUpdate, InvalidRow, NewDiaryRow, NewPhotoRow, PhotoRow, TempPhotoRow,
    row_to_diary, row_to_photo, row_to_temp_photo,
};
use super::pool::{DbPool, PoolError};
use super::schema::{diaries, photos, temp_photos, upload_sessions};

/// Diesel-backed implementation of the diary repository port.
///
/// Holds the object store because promotion copies objects inside the
/// database transaction.
#[derive(Clone)]
pub struct DieselDiaryRepository {
    pool: DbPool,
    store: Arc<dyn ObjectStore>,
}

impl DieselDiaryRepository {
    /// Create a new repository with the given connection pool and store.
    pub fn new(pool: DbPool, store: Arc<dyn ObjectStore>) -> Self {
        Self { pool, store }
    }
}

fn map_pool_error(error: PoolError) -> DiaryRepositoryError {
    map_basic_pool_error(error, DiaryRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DiaryRepositoryError {
    map_basic_diesel_error(
        error,
        DiaryRepositoryError::query,
        DiaryRepositoryError::connection,
    )
}

fn invalid_row(error: InvalidRow) -> DiaryRepositoryError {
    DiaryRepositoryError::query(error.to_string())
}

/// Reasons the promotion transaction rolled back.
#[derive(Debug, thiserror::Error)]
enum PromotionFailure {
    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),
    #[error("upload session is not claimable")]
    SessionUnavailable,
    #[error("storage step failed: {0}")]
    Storage(String),
    #[error(transparent)]
    Corrupt(#[from] InvalidRow),
}

impl From<PromotionFailure> for DiaryRepositoryError {
    fn from(failure: PromotionFailure) -> Self {
        match failure {
            PromotionFailure::Diesel(error) => map_diesel_error(error),
            PromotionFailure::SessionUnavailable => Self::session_unavailable(),
            PromotionFailure::Storage(message) => Self::storage(message),
            PromotionFailure::Corrupt(error) => invalid_row(error),
        }
    }
}

/// Load photos for `diary_ids`, grouped by diary.
async fn load_photos(
    conn: &mut AsyncPgConnection,
    diary_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Photo>>, DiaryRepositoryError> {
    if diary_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<PhotoRow> = photos::table
        .filter(photos::diary_id.eq_any(diary_ids))
        .order((photos::diary_id.asc(), photos::sort_order.asc()))
        .select(PhotoRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut grouped: HashMap<Uuid, Vec<Photo>> = HashMap::new();
    for row in rows {
        let photo = row_to_photo(row).map_err(invalid_row)?;
        grouped
            .entry(*photo.diary_id.as_uuid())
            .or_default()
            .push(photo);
    }
    Ok(grouped)
}

fn to_i64(value: u64, what: &str) -> Result<i64, DiaryRepositoryError> {
    i64::try_from(value).map_err(|_| DiaryRepositoryError::query(format!("{what} out of range")))
}

#[async_trait]
impl DiaryRepository for DieselDiaryRepository {
    async fn create(&self, diary: &Diary) -> Result<(), DiaryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(diaries::table)
            .values(NewDiaryRow::from(diary))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn create_with_promotion(
        &self,
        diary: &Diary,
        upload_id: UploadSessionId,
        now: DateTime<Utc>,
    ) -> Result<PromotedDiary, DiaryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let store = Arc::clone(&self.store);
        let new_diary = NewDiaryRow::from(diary);
        let upload_uuid = *upload_id.as_uuid();
        let owner_uuid = *diary.user_id().as_uuid();

        let plan = conn
            .transaction(|conn| {
                async move {
                    // Only a pending, unexpired session owned by the caller
                    // can be claimed; a concurrent claim sees zero rows.
                    let claimed = diesel::update(
                        upload_sessions::table.filter(
                            upload_sessions::id
                                .eq(upload_uuid)
                                .and(upload_sessions::user_id.eq(owner_uuid))
                                .and(upload_sessions::status.eq(UploadStatus::Pending.as_str()))
                                .and(upload_sessions::expires_at.gt(now)),
                        ),
                    )
                    .set((
                        upload_sessions::status.eq(UploadStatus::Completed.as_str()),
                        upload_sessions::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;
                    if claimed == 0 {
                        return Err(PromotionFailure::SessionUnavailable);
                    }

                    diesel::insert_into(diaries::table)
                        .values(&new_diary)
                        .execute(conn)
                        .await?;

                    let staged: Vec<TempPhotoRow> = temp_photos::table
                        .filter(temp_photos::upload_id.eq(upload_uuid))
                        .select(TempPhotoRow::as_select())
                        .load(conn)
                        .await?;
                    let staged = staged
                        .into_iter()
                        .map(row_to_temp_photo)
                        .collect::<Result<Vec<_>, _>>()?;

                    let plan = plan_promotion(diary, staged, now);
                    for step in &plan {
                        store
                            .copy(&step.staging_key, &step.photo.storage_key)
                            .await
                            .map_err(|err| PromotionFailure::Storage(err.to_string()))?;
                        diesel::insert_into(photos::table)
                            .values(NewPhotoRow::try_from(&step.photo)?)
                            .execute(conn)
                            .await?;
                    }

                    diesel::delete(temp_photos::table.filter(temp_photos::upload_id.eq(upload_uuid)))
                        .execute(conn)
                        .await?;

                    Ok::<_, PromotionFailure>(plan)
                }
                .scope_boxed()
            })
            .await?;

        debug!(
            diary_id = %diary.id(),
            upload_id = %upload_id,
            photos = plan.len(),
            "promotion transaction committed"
        );

        let mut staging_keys = Vec::with_capacity(plan.len());
        let mut promoted = Vec::with_capacity(plan.len());
        for step in plan {
            staging_keys.push(step.staging_key);
            promoted.push(step.photo);
        }

        Ok(PromotedDiary {
            diary: diary.clone().with_photos(promoted),
            staging_keys,
        })
    }

    async fn find_for_user(
        &self,
        diary_id: DiaryId,
        user_id: &UserId,
    ) -> Result<Option<Diary>, DiaryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diaries::table
            .filter(
                diaries::id
                    .eq(diary_id.as_uuid())
                    .and(diaries::user_id.eq(user_id.as_uuid())),
            )
            .select(DiaryRow::as_select())
            .first::<DiaryRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut photos = load_photos(&mut conn, &[row.id]).await?;
        let attached = photos.remove(&row.id).unwrap_or_default();
        row_to_diary(row, attached).map(Some).map_err(invalid_row)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Paginated<Diary>, DiaryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = diaries::table
            .filter(diaries::user_id.eq(user_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows: Vec<DiaryRow> = diaries::table
            .filter(diaries::user_id.eq(user_id.as_uuid()))
            .order((
                diaries::diary_date.desc(),
                diaries::created_at.desc(),
                diaries::id.asc(),
            ))
            .limit(i64::from(page.limit()))
            .offset(to_i64(page.offset(), "page offset")?)
            .select(DiaryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut photos = load_photos(&mut conn, &ids).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let attached = photos.remove(&row.id).unwrap_or_default();
                row_to_diary(row, attached).map_err(invalid_row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = u64::try_from(total)
            .map_err(|_| DiaryRepositoryError::query("negative diary count"))?;
        Ok(Paginated::new(items, page, total))
    }

    async fn update(&self, diary: &Diary) -> Result<bool, DiaryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            diaries::table.filter(
                diaries::id
                    .eq(diary.id().as_uuid())
                    .and(diaries::user_id.eq(diary.user_id().as_uuid())),
            ),
        )
        .set(DiaryUpdate::from(diary))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete_for_user(
        &self,
        diary_id: DiaryId,
        user_id: &UserId,
    ) -> Result<Option<Vec<Photo>>, DiaryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let diary_uuid = *diary_id.as_uuid();
        let owner_uuid = *user_id.as_uuid();

        // Photo rows go with the diary through the cascading foreign key.
        let removed = conn
            .transaction(|conn| {
                async move {
                    let owned = diaries::table
                        .filter(diaries::id.eq(diary_uuid).and(diaries::user_id.eq(owner_uuid)))
                        .select(diaries::id)
                        .for_update()
                        .first::<Uuid>(conn)
                        .await
                        .optional()?;
                    if owned.is_none() {
                        return Ok(None);
                    }

                    let rows: Vec<PhotoRow> = photos::table
                        .filter(photos::diary_id.eq(diary_uuid))
                        .order(photos::sort_order.asc())
                        .select(PhotoRow::as_select())
                        .load(conn)
                        .await?;

                    diesel::delete(diaries::table.filter(diaries::id.eq(diary_uuid)))
                        .execute(conn)
                        .await?;

                    Ok::<_, diesel::result::Error>(Some(rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        removed
            .map(|rows| {
                rows.into_iter()
                    .map(|row| row_to_photo(row).map_err(invalid_row))
                    .collect()
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for promotion failure mapping.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unclaimable_session_maps_to_session_unavailable() {
        let mapped = DiaryRepositoryError::from(PromotionFailure::SessionUnavailable);
        assert_eq!(mapped, DiaryRepositoryError::SessionUnavailable);
    }

    #[rstest]
    fn storage_failure_keeps_message() {
        let mapped = DiaryRepositoryError::from(PromotionFailure::Storage("copy refused".into()));
        assert_eq!(mapped, DiaryRepositoryError::storage("copy refused"));
    }

    #[rstest]
    fn missing_rows_inside_the_transaction_map_to_query_errors() {
        let mapped = DiaryRepositoryError::from(PromotionFailure::Diesel(
            diesel::result::Error::NotFound,
        ));
        assert!(matches!(mapped, DiaryRepositoryError::Query { .. }));
    }
}
