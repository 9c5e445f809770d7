//! Account domain service: signup, login and bearer token verification.
//!
//! Unknown emails and wrong passwords produce the same `Unauthorized` error
//! so login responses do not reveal which accounts exist.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    AccountCommand, PasswordHashError, PasswordHasher, TokenAuthenticator, TokenError,
    TokenService, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AuthSession, AuthenticatedUser, Error, LoginCredentials, SignupDetails, User, UserAccount,
    UserId,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Account service implementing the signup/login and token driving ports.
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<dyn TokenService>,
    clock: Arc<dyn Clock>,
}

impl<U, H> AccountService<U, H> {
    /// Create a new service from its collaborators.
    pub fn new(
        users: Arc<U>,
        hasher: Arc<H>,
        tokens: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
        }
    }
}

fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { .. } => Error::conflict("email already registered"),
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

fn map_token_error(error: TokenError) -> Error {
    match error {
        TokenError::Expired => Error::forbidden("access token expired"),
        TokenError::Invalid { .. } => Error::forbidden("invalid access token"),
        TokenError::Signing { message } => {
            Error::internal(format!("failed to issue access token: {message}"))
        }
    }
}

impl<U, H> AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    fn issue_session(&self, user: User) -> Result<AuthSession, Error> {
        let token = self
            .tokens
            .issue(&user, self.clock.utc())
            .map_err(map_token_error)?;
        Ok(AuthSession { token, user })
    }
}

#[async_trait]
impl<U, H> AccountCommand for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn signup(&self, details: SignupDetails) -> Result<AuthSession, Error> {
        // Fail fast before paying for a hash; the unique index still guards races.
        if self
            .users
            .find_by_email(details.email())
            .await
            .map_err(map_user_repository_error)?
            .is_some()
        {
            return Err(Error::conflict("email already registered"));
        }

        let password_hash = self
            .hasher
            .hash(details.password())
            .await
            .map_err(map_hash_error)?;
        let user = User::new(
            UserId::random(),
            details.email().clone(),
            details.display_name().clone(),
            self.clock.utc(),
        );
        let account = UserAccount {
            user,
            password_hash,
        };
        self.users
            .insert(&account)
            .await
            .map_err(map_user_repository_error)?;

        info!(user_id = %account.user.id(), "account registered");
        self.issue_session(account.user)
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        let Some(account) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_repository_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        self.issue_session(account.user)
    }
}

impl<U, H> TokenAuthenticator for AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, Error> {
        self.tokens
            .verify(token, self.clock.utc())
            .map_err(map_token_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
