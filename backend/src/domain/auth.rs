//! Authentication primitives: credentials, password hashes and access tokens.
//!
//! Inbound adapters parse raw strings into these types before calling the
//! account driving port, so services only ever see validated values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::{DisplayName, Email, User, UserId, UserValidationError};

/// Minimum password length accepted at signup.
pub const PASSWORD_MIN: usize = 8;
/// Maximum password length; bounds hashing cost for hostile input.
pub const PASSWORD_MAX: usize = 128;

/// Domain error returned when signup or login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email failed validation.
    Email(UserValidationError),
    /// Display name failed validation.
    DisplayName(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
    /// Password longer than [`PASSWORD_MAX`].
    PasswordTooLong { max: usize },
}

impl CredentialsValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::DisplayName(_) => "displayName",
            Self::EmptyPassword | Self::PasswordTooShort { .. } | Self::PasswordTooLong { .. } => {
                "password"
            }
        }
    }
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) | Self::DisplayName(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordTooLong { max } => write!(f, "password must be at most {max} characters"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Plain-text password held in memory that is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(Zeroizing<String>);

impl PlainPassword {
    /// Accept any non-empty password; used for login.
    pub fn for_login(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if raw.chars().count() > PASSWORD_MAX {
            return Err(CredentialsValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Enforce the signup length policy.
    pub fn for_signup(raw: &str) -> Result<Self, CredentialsValidationError> {
        let password = Self::for_login(raw)?;
        if raw.chars().count() < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(password)
    }

    /// Expose the secret for hashing or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(**redacted**)")
    }
}

/// Validated signup payload.
///
/// # Examples
/// ```
/// use diary_backend::domain::SignupDetails;
///
/// let details = SignupDetails::try_from_parts("Ada@Example.com", "correct horse", "Ada")
///     .expect("valid signup");
/// assert_eq!(details.email().as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupDetails {
    email: Email,
    password: PlainPassword,
    display_name: DisplayName,
}

impl SignupDetails {
    /// Validate raw signup fields.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: Email::new(email).map_err(CredentialsValidationError::Email)?,
            password: PlainPassword::for_signup(password)?,
            display_name: DisplayName::new(display_name)
                .map_err(CredentialsValidationError::DisplayName)?,
        })
    }

    /// Account email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Chosen password.
    pub fn password(&self) -> &PlainPassword {
        &self.password
    }

    /// Chosen display name.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is normalised like [`Email`].
/// - `password` is non-empty and keeps caller-provided whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: PlainPassword,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: Email::new(email).map_err(CredentialsValidationError::Email)?,
            password: PlainPassword::for_login(password)?,
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password presented by the caller.
    pub fn password(&self) -> &PlainPassword {
        &self.password
    }
}

/// Encoded password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash loaded from storage or produced by a hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(**redacted**)")
    }
}

/// Stored account: public user data plus the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// Signed bearer token handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[schema(value_type = String)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an encoded token.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Identity recovered from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: Email,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful signup or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthSession {
    pub token: AccessToken,
    pub user: User,
}
