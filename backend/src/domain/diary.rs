//! Diary entries and their permanent photos.
//!
//! Photos only come into existence through promotion: staged uploads are
//! planned into [`PhotoPromotion`] steps that pair a staging key with the
//! permanent [`Photo`] it becomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ImageMimeType, TempPhoto, UserId};

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum content length in characters.
pub const CONTENT_MAX: usize = 10_000;

/// Validation errors for diary payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiaryValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("content must not be empty")]
    EmptyContent,
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
    #[error("date must be an ISO 8601 date or timestamp")]
    InvalidDate,
}

impl DiaryValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle | Self::TitleTooLong { .. } => "title",
            Self::EmptyContent | Self::ContentTooLong { .. } => "content",
            Self::InvalidDate => "date",
        }
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// Diary entry identifier.
    DiaryId
}

uuid_id! {
    /// Permanent photo identifier.
    PhotoId
}

/// Diary title, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryTitle(String);

impl DiaryTitle {
    pub fn new(raw: &str) -> Result<Self, DiaryValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DiaryValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(DiaryValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DiaryTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Diary body text. Leading and trailing whitespace is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryContent(String);

impl DiaryContent {
    pub fn new(raw: &str) -> Result<Self, DiaryValidationError> {
        if raw.trim().is_empty() {
            return Err(DiaryValidationError::EmptyContent);
        }
        if raw.chars().count() > CONTENT_MAX {
            return Err(DiaryValidationError::ContentTooLong { max: CONTENT_MAX });
        }
        Ok(Self(raw.to_owned()))
    }
}

impl AsRef<str> for DiaryContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a logical diary date from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps keep the calendar date in their own offset.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use diary_backend::domain::parse_diary_date;
///
/// let expected = NaiveDate::from_ymd_opt(2026, 5, 4).expect("date");
/// assert_eq!(parse_diary_date("2026-05-04").ok(), Some(expected));
/// assert_eq!(parse_diary_date("2026-05-04T23:30:00+09:00").ok(), Some(expected));
/// ```
pub fn parse_diary_date(raw: &str) -> Result<NaiveDate, DiaryValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|ts| ts.date_naive()))
        .map_err(|_| DiaryValidationError::InvalidDate)
}

/// Validated fields for a new diary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryDraft {
    pub title: DiaryTitle,
    pub content: DiaryContent,
    pub date: NaiveDate,
}

impl DiaryDraft {
    /// Validate raw create-request fields.
    pub fn try_from_parts(title: &str, content: &str, date: &str) -> Result<Self, DiaryValidationError> {
        Ok(Self {
            title: DiaryTitle::new(title)?,
            content: DiaryContent::new(content)?,
            date: parse_diary_date(date)?,
        })
    }
}

/// Validated partial update; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiaryChanges {
    pub title: Option<DiaryTitle>,
    pub content: Option<DiaryContent>,
    pub date: Option<NaiveDate>,
}

impl DiaryChanges {
    /// Validate raw update-request fields.
    pub fn try_from_parts(
        title: Option<&str>,
        content: Option<&str>,
        date: Option<&str>,
    ) -> Result<Self, DiaryValidationError> {
        Ok(Self {
            title: title.map(DiaryTitle::new).transpose()?,
            content: content.map(DiaryContent::new).transpose()?,
            date: date.map(parse_diary_date).transpose()?,
        })
    }
}

/// A photo attached to a diary.
///
/// ## Invariants
/// - `order` is unique within the owning diary.
/// - `thumbnail_key` equals `storage_key`; no thumbnails are generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: PhotoId,
    pub diary_id: DiaryId,
    pub storage_key: String,
    pub thumbnail_key: String,
    pub size_bytes: u64,
    pub mime_type: ImageMimeType,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

/// A diary entry with its photos in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diary {
    id: DiaryId,
    user_id: UserId,
    title: DiaryTitle,
    content: DiaryContent,
    date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    photos: Vec<Photo>,
}

/// Field bundle used to rebuild a diary from storage.
#[derive(Debug, Clone)]
pub struct DiaryRecord {
    pub id: DiaryId,
    pub user_id: UserId,
    pub title: DiaryTitle,
    pub content: DiaryContent,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub photos: Vec<Photo>,
}

impl Diary {
    /// Start a new diary owned by `user_id` with no photos.
    pub fn create(user_id: UserId, draft: DiaryDraft, now: DateTime<Utc>) -> Self {
        let DiaryDraft {
            title,
            content,
            date,
        } = draft;
        Self {
            id: DiaryId::random(),
            user_id,
            title,
            content,
            date,
            created_at: now,
            updated_at: now,
            photos: Vec::new(),
        }
    }

    /// Rebuild a stored diary; photos are sorted by `order`.
    pub fn restore(record: DiaryRecord) -> Self {
        let DiaryRecord {
            id,
            user_id,
            title,
            content,
            date,
            created_at,
            updated_at,
            mut photos,
        } = record;
        photos.sort_by_key(|photo| photo.order);
        Self {
            id,
            user_id,
            title,
            content,
            date,
            created_at,
            updated_at,
            photos,
        }
    }

    pub fn id(&self) -> DiaryId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn title(&self) -> &DiaryTitle {
        &self.title
    }

    pub fn content(&self) -> &DiaryContent {
        &self.content
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Photos in display order.
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Attach promoted photos, keeping display order.
    pub fn with_photos(mut self, mut photos: Vec<Photo>) -> Self {
        photos.sort_by_key(|photo| photo.order);
        self.photos = photos;
        self
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, changes: DiaryChanges, now: DateTime<Utc>) {
        let DiaryChanges {
            title,
            content,
            date,
        } = changes;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(date) = date {
            self.date = date;
        }
        self.updated_at = now;
    }
}

/// Permanent key for a promoted photo.
pub fn permanent_photo_key(user_id: &UserId, diary_id: DiaryId, photo_id: PhotoId, extension: &str) -> String {
    format!("photos/{user_id}/{diary_id}/{photo_id}.{extension}")
}

/// One copy-and-record step of the promotion workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPromotion {
    pub staging_key: String,
    pub photo: Photo,
}

/// Plan the promotion of `temp_photos` into `diary`.
///
/// Staged files are ordered by staging index, then confirmation time, and
/// receive orders `0..N-1`. The permanent key keeps the staged extension.
pub fn plan_promotion(diary: &Diary, mut temp_photos: Vec<TempPhoto>, now: DateTime<Utc>) -> Vec<PhotoPromotion> {
    temp_photos.sort_by(|a, b| {
        a.staging_index
            .cmp(&b.staging_index)
            .then(a.created_at.cmp(&b.created_at))
    });

    temp_photos
        .into_iter()
        .zip(0_u32..)
        .map(|(temp, order)| {
            let photo_id = PhotoId::random();
            let extension = temp
                .staging_key
                .rsplit_once('.')
                .map_or(temp.mime_type.extension(), |(_, ext)| ext);
            let storage_key = permanent_photo_key(diary.user_id(), diary.id(), photo_id, extension);
            PhotoPromotion {
                photo: Photo {
                    id: photo_id,
                    diary_id: diary.id(),
                    thumbnail_key: storage_key.clone(),
                    storage_key,
                    size_bytes: temp.size_bytes,
                    mime_type: temp.mime_type,
                    order,
                    created_at: now,
                },
                staging_key: temp.staging_key,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "diary_tests.rs"]
mod tests;
