//! Port for issuing and verifying bearer access tokens.

use chrono::{DateTime, Utc};

use crate::domain::{AccessToken, AuthenticatedUser, User};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenError {
        /// The token's lifetime has elapsed.
        Expired => "access token expired",
        /// The token is malformed or its signature does not verify.
        Invalid { message: String } => "access token invalid: {message}",
        /// Encoding a new token failed.
        Signing { message: String } => "access token signing failed: {message}",
    }
}

/// Signed-token scheme used for bearer authentication.
///
/// Callers pass the current time so expiry follows the injected clock.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Issue a token for `user` starting at `issued_at`.
    fn issue(&self, user: &User, issued_at: DateTime<Utc>) -> Result<AccessToken, TokenError>;

    /// Verify `token` and recover the authenticated identity.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, TokenError>;
}
