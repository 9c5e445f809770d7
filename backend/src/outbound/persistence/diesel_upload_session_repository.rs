//! PostgreSQL-backed `UploadSessionRepository` implementation.
//!
//! Sessions and their staged photos live in `upload_sessions` and
//! `temp_photos`. The `(upload_id, file_id)` primary key rejects a second
//! confirmation of the same file.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UploadSessionRepository, UploadSessionRepositoryError};
use crate::domain::{TempPhoto, UploadSession, UploadSessionId, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    NewTempPhotoRow, NewUploadSessionRow, TempPhotoRow, UploadSessionRow, row_to_temp_photo,
    row_to_upload_session,
};
use super::pool::{DbPool, PoolError};
use super::schema::{temp_photos, upload_sessions};

/// Diesel-backed implementation of the upload session repository port.
#[derive(Clone)]
pub struct DieselUploadSessionRepository {
    pool: DbPool,
}

impl DieselUploadSessionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UploadSessionRepositoryError {
    map_basic_pool_error(error, UploadSessionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UploadSessionRepositoryError {
    map_basic_diesel_error(
        error,
        UploadSessionRepositoryError::query,
        UploadSessionRepositoryError::connection,
    )
}

fn invalid_row(error: impl ToString) -> UploadSessionRepositoryError {
    UploadSessionRepositoryError::query(error.to_string())
}

#[async_trait]
impl UploadSessionRepository for DieselUploadSessionRepository {
    async fn create(&self, session: &UploadSession) -> Result<(), UploadSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(upload_sessions::table)
            .values(NewUploadSessionRow::from(session))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_for_user(
        &self,
        upload_id: UploadSessionId,
        user_id: &UserId,
    ) -> Result<Option<UploadSession>, UploadSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = upload_sessions::table
            .filter(
                upload_sessions::id
                    .eq(upload_id.as_uuid())
                    .and(upload_sessions::user_id.eq(user_id.as_uuid())),
            )
            .select(UploadSessionRow::as_select())
            .first::<UploadSessionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row_to_upload_session(row).map_err(invalid_row))
            .transpose()
    }

    async fn list_temp_photos(
        &self,
        upload_id: UploadSessionId,
    ) -> Result<Vec<TempPhoto>, UploadSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TempPhotoRow> = temp_photos::table
            .filter(temp_photos::upload_id.eq(upload_id.as_uuid()))
            .order((temp_photos::staging_index.asc(), temp_photos::created_at.asc()))
            .select(TempPhotoRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row_to_temp_photo(row).map_err(invalid_row))
            .collect()
    }

    async fn add_temp_photo(&self, photo: &TempPhoto) -> Result<(), UploadSessionRepositoryError> {
        let new_row = NewTempPhotoRow::try_from(photo).map_err(invalid_row)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(temp_photos::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| {
                if is_unique_violation(&error) {
                    UploadSessionRepositoryError::duplicate_file(photo.file_id.as_str())
                } else {
                    map_diesel_error(error)
                }
            })
    }
}
