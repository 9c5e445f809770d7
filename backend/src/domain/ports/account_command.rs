//! Driving port for account signup and login.
//!
//! Inbound adapters hand over validated credentials and receive a signed
//! session; hashing and token issuance stay behind the port.

use async_trait::async_trait;

use crate::domain::{AuthSession, Error, LoginCredentials, SignupDetails};

/// Domain use-case port for account creation and authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register a new account and sign it in.
    async fn signup(&self, details: SignupDetails) -> Result<AuthSession, Error>;

    /// Check credentials and sign the account in.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;
}
