//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed diary entities and the use-case services
//! that drive them. Adapters talk to the domain only through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Diary, UploadSession: the aggregates persisted by adapters.
//! - AccountService, UploadSessionService, DiaryService: driving port
//!   implementations.

pub mod auth;
pub mod diary;
pub mod error;
pub mod ports;
pub mod trace_id;
pub mod upload;
pub mod user;

mod account_service;
mod diary_service;
mod upload_session_service;

pub use self::account_service::AccountService;
pub use self::auth::{
    AccessToken, AuthSession, AuthenticatedUser, CredentialsValidationError, LoginCredentials,
    PASSWORD_MAX, PASSWORD_MIN, PasswordHash, PlainPassword, SignupDetails, UserAccount,
};
pub use self::diary::{
    CONTENT_MAX, Diary, DiaryChanges, DiaryContent, DiaryDraft, DiaryId, DiaryRecord, DiaryTitle,
    DiaryValidationError, Photo, PhotoId, PhotoPromotion, TITLE_MAX, parse_diary_date,
    permanent_photo_key, plan_promotion,
};
pub use self::diary_service::DiaryService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::upload::{
    ImageMimeType, MAX_DIRECT_UPLOAD_BYTES, MAX_FILES_PER_SESSION, PRESIGNED_UPLOAD_TTL,
    TempPhoto, UPLOAD_SESSION_TTL_SECS, UploadSession, UploadSessionDraft, UploadSessionId,
    UploadSessionSnapshot, UploadStatus, UploadTarget, UploadValidationError,
    content_type_for_extension, file_extension, staged_file_id, staging_key, staging_prefix,
};
pub use self::upload_session_service::UploadSessionService;
pub use self::user::{
    DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, DisplayName, EMAIL_MAX, Email, User, UserId,
    UserValidationError,
};
