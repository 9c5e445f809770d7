//! Internal Diesel row structs and their conversions to domain types.
//!
//! These types never leave the persistence layer. Conversions fail with
//! [`InvalidRow`] when stored values no longer satisfy domain invariants;
//! repositories report that as a query error.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Diary, DiaryContent, DiaryId, DiaryRecord, DiaryTitle, DisplayName, Email, ImageMimeType,
    PasswordHash, Photo, PhotoId, TempPhoto, UploadSession, UploadSessionDraft, UploadSessionId,
    User, UserAccount, UserId,
};

use super::schema::{diaries, photos, temp_photos, upload_sessions, users};

/// A stored row that no longer converts into a valid domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {table} row: {message}")]
pub(crate) struct InvalidRow {
    table: &'static str,
    message: String,
}

impl InvalidRow {
    fn new(table: &'static str, message: impl ToString) -> Self {
        Self {
            table,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a UserAccount> for NewUserRow<'a> {
    fn from(account: &'a UserAccount) -> Self {
        let user = &account.user;
        Self {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            password_hash: account.password_hash.as_ref(),
            display_name: user.display_name().as_ref(),
            created_at: user.created_at(),
            updated_at: user.created_at(),
        }
    }
}

pub(crate) fn row_to_account(row: UserRow) -> Result<UserAccount, InvalidRow> {
    let email = Email::new(&row.email).map_err(|err| InvalidRow::new("users", err))?;
    let display_name =
        DisplayName::new(&row.display_name).map_err(|err| InvalidRow::new("users", err))?;
    Ok(UserAccount {
        user: User::new(
            UserId::from_uuid(row.id),
            email,
            display_name,
            row.created_at,
        ),
        password_hash: PasswordHash::new(row.password_hash),
    })
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = upload_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UploadSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_count: i16,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = upload_sessions)]
pub(crate) struct NewUploadSessionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_count: i16,
    pub status: &'a str,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a UploadSession> for NewUploadSessionRow<'a> {
    fn from(session: &'a UploadSession) -> Self {
        Self {
            id: *session.id().as_uuid(),
            user_id: *session.user_id().as_uuid(),
            file_count: i16::from(session.file_count()),
            status: session.status().as_str(),
            expires_at: session.expires_at(),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        }
    }
}

pub(crate) fn row_to_upload_session(row: UploadSessionRow) -> Result<UploadSession, InvalidRow> {
    let invalid = |err: &dyn std::fmt::Display| InvalidRow::new("upload_sessions", err);
    let file_count = u8::try_from(row.file_count).map_err(|err| invalid(&err))?;
    let status = row.status.parse().map_err(|err| invalid(&err))?;
    UploadSession::restore(UploadSessionDraft {
        id: UploadSessionId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        file_count,
        status,
        expires_at: row.expires_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|err| invalid(&err))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = temp_photos)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TempPhotoRow {
    pub upload_id: Uuid,
    pub file_id: String,
    pub staging_index: i16,
    pub staging_key: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = temp_photos)]
pub(crate) struct NewTempPhotoRow<'a> {
    pub upload_id: Uuid,
    pub file_id: &'a str,
    pub staging_index: i16,
    pub staging_key: &'a str,
    pub size_bytes: i64,
    pub mime_type: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a TempPhoto> for NewTempPhotoRow<'a> {
    type Error = InvalidRow;

    fn try_from(photo: &'a TempPhoto) -> Result<Self, Self::Error> {
        Ok(Self {
            upload_id: *photo.upload_id.as_uuid(),
            file_id: &photo.file_id,
            staging_index: i16::from(photo.staging_index),
            staging_key: &photo.staging_key,
            size_bytes: i64::try_from(photo.size_bytes)
                .map_err(|err| InvalidRow::new("temp_photos", err))?,
            mime_type: photo.mime_type.as_str(),
            created_at: photo.created_at,
        })
    }
}

pub(crate) fn row_to_temp_photo(row: TempPhotoRow) -> Result<TempPhoto, InvalidRow> {
    let invalid = |err: &dyn std::fmt::Display| InvalidRow::new("temp_photos", err);
    Ok(TempPhoto {
        upload_id: UploadSessionId::from_uuid(row.upload_id),
        file_id: row.file_id,
        staging_index: u8::try_from(row.staging_index).map_err(|err| invalid(&err))?,
        staging_key: row.staging_key,
        size_bytes: u64::try_from(row.size_bytes).map_err(|err| invalid(&err))?,
        mime_type: row
            .mime_type
            .parse::<ImageMimeType>()
            .map_err(|err| invalid(&err))?,
        created_at: row.created_at,
    })
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = diaries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DiaryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub diary_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = diaries)]
pub(crate) struct NewDiaryRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub content: &'a str,
    pub diary_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Diary> for NewDiaryRow<'a> {
    fn from(diary: &'a Diary) -> Self {
        Self {
            id: *diary.id().as_uuid(),
            user_id: *diary.user_id().as_uuid(),
            title: diary.title().as_ref(),
            content: diary.content().as_ref(),
            diary_date: diary.date(),
            created_at: diary.created_at(),
            updated_at: diary.updated_at(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = diaries)]
pub(crate) struct DiaryUpdate<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub diary_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Diary> for DiaryUpdate<'a> {
    fn from(diary: &'a Diary) -> Self {
        Self {
            title: diary.title().as_ref(),
            content: diary.content().as_ref(),
            diary_date: diary.date(),
            updated_at: diary.updated_at(),
        }
    }
}

pub(crate) fn row_to_diary(row: DiaryRow, photos: Vec<Photo>) -> Result<Diary, InvalidRow> {
    let title = DiaryTitle::new(&row.title).map_err(|err| InvalidRow::new("diaries", err))?;
    let content = DiaryContent::new(&row.content).map_err(|err| InvalidRow::new("diaries", err))?;
    Ok(Diary::restore(DiaryRecord {
        id: DiaryId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        title,
        content,
        date: row.diary_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
        photos,
    }))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = photos)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PhotoRow {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub storage_key: String,
    pub thumbnail_key: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = photos)]
pub(crate) struct NewPhotoRow<'a> {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub storage_key: &'a str,
    pub thumbnail_key: &'a str,
    pub size_bytes: i64,
    pub mime_type: &'a str,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a Photo> for NewPhotoRow<'a> {
    type Error = InvalidRow;

    fn try_from(photo: &'a Photo) -> Result<Self, Self::Error> {
        let invalid = |err: &dyn std::fmt::Display| InvalidRow::new("photos", err);
        Ok(Self {
            id: *photo.id.as_uuid(),
            diary_id: *photo.diary_id.as_uuid(),
            storage_key: &photo.storage_key,
            thumbnail_key: &photo.thumbnail_key,
            size_bytes: i64::try_from(photo.size_bytes).map_err(|err| invalid(&err))?,
            mime_type: photo.mime_type.as_str(),
            sort_order: i32::try_from(photo.order).map_err(|err| invalid(&err))?,
            created_at: photo.created_at,
        })
    }
}

pub(crate) fn row_to_photo(row: PhotoRow) -> Result<Photo, InvalidRow> {
    let invalid = |err: &dyn std::fmt::Display| InvalidRow::new("photos", err);
    Ok(Photo {
        id: PhotoId::from_uuid(row.id),
        diary_id: DiaryId::from_uuid(row.diary_id),
        storage_key: row.storage_key,
        thumbnail_key: row.thumbnail_key,
        size_bytes: u64::try_from(row.size_bytes).map_err(|err| invalid(&err))?,
        mime_type: row.mime_type.parse().map_err(|err| invalid(&err))?,
        order: u32::try_from(row.sort_order).map_err(|err| invalid(&err))?,
        created_at: row.created_at,
    })
}
