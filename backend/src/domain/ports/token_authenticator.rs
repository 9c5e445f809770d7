//! Driving port used by the bearer-token extractor.

use crate::domain::{AuthenticatedUser, Error};

/// Resolve a bearer token into the caller's identity.
#[cfg_attr(test, mockall::automock)]
pub trait TokenAuthenticator: Send + Sync {
    /// Verify `token`; failures map to `Forbidden`.
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, Error>;
}
