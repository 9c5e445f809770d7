//! Upload sessions and staged (temporary) photos.
//!
//! A session groups the files a client intends to attach to one diary. Files
//! land under a per-session staging prefix in the object store and are
//! recorded as [`TempPhoto`] rows once confirmed. Session expiry is evaluated
//! lazily against the clock; nothing flips stored statuses in the background.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Lifetime of an upload session, in seconds.
pub const UPLOAD_SESSION_TTL_SECS: i64 = 3600;
/// Lifetime of a presigned upload URL.
pub const PRESIGNED_UPLOAD_TTL: Duration = Duration::from_secs(300);
/// Upper bound on files per session.
pub const MAX_FILES_PER_SESSION: u8 = 10;
/// Upper bound on bytes accepted by the direct-upload flow.
pub const MAX_DIRECT_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const DEFAULT_EXTENSION: &str = "jpg";

/// Validation errors for upload sessions and staged files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadValidationError {
    #[error("fileCount must be between 1 and {max}")]
    FileCountOutOfRange { max: u8 },
    #[error("fileNames must contain between 1 and {max} entries")]
    FileNamesOutOfRange { max: u8 },
    #[error("fileId {file_id} was not issued by this upload session")]
    UnknownFileId { file_id: String },
    #[error("filePath must equal the staging key issued for {file_id}")]
    StagingKeyMismatch { file_id: String },
    #[error("mimeType {value} is not a supported image type")]
    UnsupportedMimeType { value: String },
    #[error("fileSize must be at least 1 byte")]
    EmptyFile,
    #[error("file exceeds the {max} byte limit")]
    FileTooLarge { max: u64 },
    #[error("file index {index} is outside the session's {file_count} expected files")]
    IndexOutOfRange { index: u8, file_count: u8 },
    #[error("unknown upload status: {value}")]
    UnknownStatus { value: String },
}

impl UploadValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::FileCountOutOfRange { .. } => "fileCount",
            Self::FileNamesOutOfRange { .. } => "fileNames",
            Self::UnknownFileId { .. } => "fileId",
            Self::StagingKeyMismatch { .. } => "filePath",
            Self::UnsupportedMimeType { .. } => "mimeType",
            Self::EmptyFile | Self::FileTooLarge { .. } => "fileSize",
            Self::IndexOutOfRange { .. } => "index",
            Self::UnknownStatus { .. } => "status",
        }
    }
}

/// Upload session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadSessionId(Uuid);

impl UploadSessionId {
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

impl fmt::Display for UploadSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UploadSessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Completed,
    Expired,
}

impl UploadStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }
}

impl FromStr for UploadStatus {
    type Err = UploadValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            other => Err(UploadValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// Image formats accepted for diary photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Heic,
    Heif,
}

impl ImageMimeType {
    /// MIME string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Canonical file extension for objects of this type.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Heic => "heic",
            Self::Heif => "heif",
        }
    }
}

impl FromStr for ImageMimeType {
    type Err = UploadValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Drop parameters such as `; charset=binary`.
        let essence = s.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/gif" => Ok(Self::Gif),
            "image/webp" => Ok(Self::Webp),
            "image/heic" => Ok(Self::Heic),
            "image/heif" => Ok(Self::Heif),
            _ => Err(UploadValidationError::UnsupportedMimeType {
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for ImageMimeType {
    type Error = UploadValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageMimeType> for String {
    fn from(value: ImageMimeType) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased extension of `file_name`, defaulting to `jpg`.
///
/// # Examples
/// ```
/// use diary_backend::domain::file_extension;
///
/// assert_eq!(file_extension("Beach.PNG"), "png");
/// assert_eq!(file_extension("no-extension"), "jpg");
/// ```
pub fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_owned(),
    }
}

/// Content type advertised for an object with the given extension.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}

/// File identifier issued for slot `index` of a session.
pub fn staged_file_id(upload_id: UploadSessionId, index: u8) -> String {
    format!("{upload_id}-{index}")
}

/// Object key prefix under which a session's files are staged.
pub fn staging_prefix(user_id: &UserId, upload_id: UploadSessionId) -> String {
    format!("uploads/{user_id}/{upload_id}/")
}

/// Staging key for slot `index` with the given extension.
pub fn staging_key(user_id: &UserId, upload_id: UploadSessionId, index: u8, extension: &str) -> String {
    format!(
        "{}{}.{extension}",
        staging_prefix(user_id, upload_id),
        staged_file_id(upload_id, index)
    )
}

/// One presigned upload slot returned to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub index: u8,
    pub file_id: String,
    pub file_name: String,
    pub staging_key: String,
    pub content_type: &'static str,
}

/// Time-boxed grouping of expected uploads for one diary.
///
/// ## Invariants
/// - `file_count` lies in `1..=MAX_FILES_PER_SESSION`.
/// - `expires_at` is one hour after `created_at` for new sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    id: UploadSessionId,
    user_id: UserId,
    file_count: u8,
    status: UploadStatus,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Field bundle used to rebuild a session from storage.
#[derive(Debug, Clone)]
pub struct UploadSessionDraft {
    pub id: UploadSessionId,
    pub user_id: UserId,
    pub file_count: u8,
    pub status: UploadStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_file_count(file_count: u8) -> Result<u8, UploadValidationError> {
    if (1..=MAX_FILES_PER_SESSION).contains(&file_count) {
        Ok(file_count)
    } else {
        Err(UploadValidationError::FileCountOutOfRange {
            max: MAX_FILES_PER_SESSION,
        })
    }
}

impl UploadSession {
    /// Open a new pending session expiring one hour after `now`.
    pub fn open(
        user_id: UserId,
        file_count: u8,
        now: DateTime<Utc>,
    ) -> Result<Self, UploadValidationError> {
        let file_count = validate_file_count(file_count)?;
        Ok(Self {
            id: UploadSessionId::random(),
            user_id,
            file_count,
            status: UploadStatus::Pending,
            expires_at: now + TimeDelta::seconds(UPLOAD_SESSION_TTL_SECS),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a stored session.
    pub fn restore(draft: UploadSessionDraft) -> Result<Self, UploadValidationError> {
        let UploadSessionDraft {
            id,
            user_id,
            file_count,
            status,
            expires_at,
            created_at,
            updated_at,
        } = draft;
        Ok(Self {
            id,
            user_id,
            file_count: validate_file_count(file_count)?,
            status,
            expires_at,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> UploadSessionId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn file_count(&self) -> u8 {
        self.file_count
    }

    /// Stored status, without expiry evaluation.
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the expiry timestamp has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Status as observed at `now`: pending sessions past expiry read as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> UploadStatus {
        match self.status {
            UploadStatus::Pending if self.is_expired(now) => UploadStatus::Expired,
            status => status,
        }
    }

    /// Record that the session's files were promoted.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = UploadStatus::Completed;
        self.updated_at = now;
    }

    /// Staging key prefix for this session.
    pub fn staging_prefix(&self) -> String {
        staging_prefix(&self.user_id, self.id)
    }

    /// Derive one upload slot per expected file.
    ///
    /// Missing names default to `photo-{index}.jpg`; surplus names are ignored.
    pub fn plan_targets(&self, file_names: &[String]) -> Result<Vec<UploadTarget>, UploadValidationError> {
        let max = usize::from(MAX_FILES_PER_SESSION);
        if file_names.is_empty() || file_names.len() > max {
            return Err(UploadValidationError::FileNamesOutOfRange {
                max: MAX_FILES_PER_SESSION,
            });
        }

        Ok((0..self.file_count)
            .map(|index| {
                let file_name = file_names
                    .get(usize::from(index))
                    .map(|name| name.trim())
                    .filter(|name| !name.is_empty())
                    .map_or_else(|| format!("photo-{index}.jpg"), str::to_owned);
                let extension = file_extension(&file_name);
                UploadTarget {
                    index,
                    file_id: staged_file_id(self.id, index),
                    staging_key: staging_key(&self.user_id, self.id, index, &extension),
                    content_type: content_type_for_extension(&extension),
                    file_name,
                }
            })
            .collect())
    }

    /// Resolve the slot index encoded in a file id issued by this session.
    pub fn slot_for_file_id(&self, file_id: &str) -> Result<u8, UploadValidationError> {
        let unknown = || UploadValidationError::UnknownFileId {
            file_id: file_id.to_owned(),
        };
        let suffix = file_id
            .strip_prefix(&format!("{}-", self.id))
            .ok_or_else(unknown)?;
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return Err(unknown());
        }
        let index: u8 = suffix.parse().map_err(|_| unknown())?;
        if index >= self.file_count {
            return Err(unknown());
        }
        Ok(index)
    }

    /// Check that `staging_key` is the key issued for `file_id`.
    ///
    /// The extension is chosen by the client from its file name, so only the
    /// prefix and file id are fixed.
    pub fn check_staging_key(&self, file_id: &str, staging_key: &str) -> Result<(), UploadValidationError> {
        let expected = format!("{}{file_id}.", self.staging_prefix());
        let valid = staging_key
            .strip_prefix(&expected)
            .is_some_and(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        if valid {
            Ok(())
        } else {
            Err(UploadValidationError::StagingKeyMismatch {
                file_id: file_id.to_owned(),
            })
        }
    }
}

/// A file staged under an upload session, awaiting promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPhoto {
    pub upload_id: UploadSessionId,
    pub file_id: String,
    pub staging_index: u8,
    pub staging_key: String,
    pub size_bytes: u64,
    pub mime_type: ImageMimeType,
    pub created_at: DateTime<Utc>,
}

/// Read projection for `GET upload-session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSessionSnapshot {
    pub session: UploadSession,
    pub status: UploadStatus,
    pub temp_photos: Vec<TempPhoto>,
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
