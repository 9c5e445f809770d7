//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Email, UserAccount};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

/// Port for storing and looking up accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; fails with `DuplicateEmail` on a taken address.
    async fn insert(&self, account: &UserAccount) -> Result<(), UserRepositoryError>;

    /// Fetch the account registered under `email`.
    async fn find_by_email(&self, email: &Email)
    -> Result<Option<UserAccount>, UserRepositoryError>;
}
