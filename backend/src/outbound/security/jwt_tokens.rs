//! HS256 JSON Web Token implementation of the `TokenService` port.
//!
//! Expiry is checked against the injected clock rather than the system
//! time, so the library's own `exp` validation is disabled.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{AccessToken, AuthenticatedUser, Email, User, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: TimeDelta,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], lifetime: TimeDelta) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> TimeDelta {
        self.lifetime
    }
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User, issued_at: DateTime<Utc>) -> Result<AccessToken, TokenError> {
        let claims = Claims {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(AccessToken::new)
            .map_err(|err| TokenError::signing(err.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            }
        })?;
        let claims = data.claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::expired());
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::invalid("exp out of range"))?;
        Ok(AuthenticatedUser {
            user_id: UserId::new(&claims.sub).map_err(|err| TokenError::invalid(err.to_string()))?,
            email: Email::new(&claims.email).map_err(|err| TokenError::invalid(err.to_string()))?,
            expires_at,
        })
    }
}

/// Rejected `JWT_EXPIRES_IN` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid token lifetime `{value}`: expected e.g. 7d, 12h, 30m, 45s or seconds")]
pub struct TokenLifetimeError {
    value: String,
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or `3600`.
///
/// # Examples
/// ```
/// use chrono::TimeDelta;
/// use diary_backend::outbound::security::parse_token_lifetime;
///
/// assert_eq!(parse_token_lifetime("7d").ok(), Some(TimeDelta::days(7)));
/// assert_eq!(parse_token_lifetime("90").ok(), Some(TimeDelta::seconds(90)));
/// assert!(parse_token_lifetime("0h").is_err());
/// ```
pub fn parse_token_lifetime(raw: &str) -> Result<TimeDelta, TokenLifetimeError> {
    let invalid = || TokenLifetimeError {
        value: raw.to_owned(),
    };
    let trimmed = raw.trim();
    let (digits, unit_secs) = match trimmed.char_indices().last() {
        Some((idx, 'd')) => (&trimmed[..idx], 86_400),
        Some((idx, 'h')) => (&trimmed[..idx], 3_600),
        Some((idx, 'm')) => (&trimmed[..idx], 60),
        Some((idx, 's')) => (&trimmed[..idx], 1),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };
    let count: i64 = digits.parse().map_err(|_| invalid())?;
    if count <= 0 {
        return Err(invalid());
    }
    count
        .checked_mul(unit_secs)
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(invalid)
}

#[cfg(test)]
#[path = "jwt_tokens_tests.rs"]
mod tests;
