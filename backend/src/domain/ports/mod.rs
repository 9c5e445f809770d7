//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod diary_command;
mod diary_query;
mod diary_repository;
mod object_store;
mod password_hasher;
mod token_authenticator;
mod token_service;
mod upload_session_command;
mod upload_session_query;
mod upload_session_repository;
mod user_repository;

pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use diary_command::{CreateDiaryRequest, DiaryCommand};
#[cfg(test)]
pub use diary_command::MockDiaryCommand;
pub use diary_query::DiaryQuery;
#[cfg(test)]
pub use diary_query::MockDiaryQuery;
#[cfg(test)]
pub use diary_repository::MockDiaryRepository;
pub use diary_repository::{DiaryRepository, DiaryRepositoryError, PromotedDiary};
#[cfg(test)]
pub use object_store::MockObjectStore;
pub use object_store::{ObjectMetadata, ObjectStore, ObjectStoreError, PresignedUpload};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use token_authenticator::MockTokenAuthenticator;
pub use token_authenticator::TokenAuthenticator;
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{TokenError, TokenService};
#[cfg(test)]
pub use upload_session_command::MockUploadSessionCommand;
pub use upload_session_command::{
    ConfirmUploadRequest, CreateUploadSessionRequest, CreatedUploadSession, DirectUploadRequest,
    PresignedTarget, UploadSessionCommand,
};
#[cfg(test)]
pub use upload_session_query::MockUploadSessionQuery;
pub use upload_session_query::UploadSessionQuery;
#[cfg(test)]
pub use upload_session_repository::MockUploadSessionRepository;
pub use upload_session_repository::{UploadSessionRepository, UploadSessionRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
