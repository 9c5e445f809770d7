//! Environment-driven application settings.
//!
//! Every knob the server needs at startup is read here through
//! [`mockable::Env`], so the parsing rules can be exercised without touching
//! the process environment. Debug builds fall back to in-memory adapters and
//! an ephemeral signing secret; release builds insist on explicit values.

mod fingerprint;
mod parsing;

use std::fmt;
use std::net::SocketAddr;

use chrono::TimeDelta;
use mockable::Env;
use rand::RngCore;
use tracing::warn;
use zeroize::Zeroizing;

use crate::outbound::storage::S3Settings;

pub use fingerprint::secret_fingerprint;
use parsing::{BoolEnvConfig, debug_warn_or_error, parse_bool_env};

const BIND_ADDR_ENV: &str = "BIND_ADDR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const RUN_MIGRATIONS_ENV: &str = "RUN_MIGRATIONS";
const JWT_SECRET_ENV: &str = "JWT_SECRET";
const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN";
const S3_BUCKET_ENV: &str = "AWS_S3_BUCKET";
const S3_REGION_ENV: &str = "AWS_REGION";
const S3_ENDPOINT_ENV: &str = "AWS_ENDPOINT_URL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REGION: &str = "ap-northeast-2";
const DEFAULT_TOKEN_LIFETIME: &str = "7d";
const BIND_ADDR_EXPECTED: &str = "host:port, e.g. 0.0.0.0:8080";
const LIFETIME_EXPECTED: &str = "<n>d|<n>h|<n>m|<n>s|<n>";

/// Minimum signing secret length accepted in release builds.
pub const JWT_SECRET_MIN_LEN: usize = 32;
const EPHEMERAL_SECRET_LEN: usize = 64;

/// Build mode for settings validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate missing values and log warnings.
    Debug,
    /// Release builds require explicit, valid values.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diary_backend::settings::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// HS256 signing secret, wiped from memory on drop.
pub struct JwtSecret {
    bytes: Zeroizing<Vec<u8>>,
    ephemeral: bool,
}

impl JwtSecret {
    fn configured(value: String) -> Self {
        Self {
            bytes: Zeroizing::new(value.into_bytes()),
            ephemeral: false,
        }
    }

    fn generate() -> Self {
        let mut bytes = vec![0_u8; EPHEMERAL_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            bytes: Zeroizing::new(bytes),
            ephemeral: true,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the secret was generated for this process only.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Short hex fingerprint safe to log.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        secret_fingerprint(&self.bytes)
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSecret")
            .field("fingerprint", &self.fingerprint())
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}

/// Settings assembled from the environment at startup.
#[derive(Debug)]
pub struct AppSettings {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; `None` selects the in-memory repositories.
    pub database_url: Option<String>,
    /// Apply embedded migrations before serving traffic.
    pub run_migrations: bool,
    pub jwt_secret: JwtSecret,
    /// Lifetime of issued bearer tokens.
    pub token_lifetime: TimeDelta,
    /// Bucket settings; `None` selects the in-memory object store.
    pub storage: Option<S3Settings>,
}

/// Errors raised while validating settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The signing secret is too short for release builds.
    #[error("{name} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        name: &'static str,
        length: usize,
        min_len: usize,
    },
}

impl AppSettings {
    /// Build settings from environment variables and build mode.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diary_backend::settings::{AppSettings, BuildMode};
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "DATABASE_URL" => Some("postgres://diary@localhost/diary".to_owned()),
    ///     "JWT_SECRET" => Some("0123456789abcdef0123456789abcdef".to_owned()),
    ///     "AWS_S3_BUCKET" => Some("diary-photos".to_owned()),
    ///     _ => None,
    /// });
    ///
    /// let settings = AppSettings::from_env(&env, BuildMode::Release).expect("valid settings");
    /// assert_eq!(settings.bind_addr.port(), 8080);
    /// assert!(settings.run_migrations);
    /// assert_eq!(settings.storage.map(|s| s.region).as_deref(), Some("ap-northeast-2"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when a release build is missing a required
    /// value or any build receives a value it cannot use.
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, SettingsError> {
        let bind_addr = bind_addr_from_env(env, mode)?;
        let database_url = required_in_release(env, mode, DATABASE_URL_ENV, "in-memory repositories")?;
        let run_migrations =
            parse_bool_env(env, mode, BoolEnvConfig::new(RUN_MIGRATIONS_ENV, true))?;
        let jwt_secret = jwt_secret_from_env(env, mode)?;
        let token_lifetime = token_lifetime_from_env(env, mode)?;
        let storage = storage_from_env(env, mode)?;

        Ok(Self {
            bind_addr,
            database_url,
            run_migrations,
            jwt_secret,
            token_lifetime,
            storage,
        })
    }
}

fn non_blank<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn bind_addr_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SocketAddr, SettingsError> {
    let default = || {
        DEFAULT_BIND_ADDR
            .parse::<SocketAddr>()
            .map_err(|_| SettingsError::InvalidEnv {
                name: BIND_ADDR_ENV,
                value: DEFAULT_BIND_ADDR.to_owned(),
                expected: BIND_ADDR_EXPECTED,
            })
    };
    let Some(value) = non_blank(env, BIND_ADDR_ENV) else {
        return default();
    };
    match value.parse::<SocketAddr>() {
        Ok(addr) => Ok(addr),
        Err(_) => {
            let fallback = default()?;
            debug_warn_or_error(
                mode,
                fallback,
                SettingsError::InvalidEnv {
                    name: BIND_ADDR_ENV,
                    value: value.clone(),
                    expected: BIND_ADDR_EXPECTED,
                },
                || warn!(value = %value, "invalid BIND_ADDR; using {DEFAULT_BIND_ADDR}"),
            )
        }
    }
}

fn required_in_release<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    fallback_label: &'static str,
) -> Result<Option<String>, SettingsError> {
    match non_blank(env, name) {
        Some(value) => Ok(Some(value)),
        None => debug_warn_or_error(mode, None, SettingsError::MissingEnv { name }, || {
            warn!("{name} not set; using {fallback_label}");
        }),
    }
}

fn jwt_secret_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<JwtSecret, SettingsError> {
    let Some(value) = env.string(JWT_SECRET_ENV).filter(|v| !v.trim().is_empty()) else {
        if mode.is_debug() {
            warn!("JWT_SECRET not set; using temporary signing secret (dev only)");
            return Ok(JwtSecret::generate());
        }
        return Err(SettingsError::MissingEnv {
            name: JWT_SECRET_ENV,
        });
    };

    let length = value.len();
    if length < JWT_SECRET_MIN_LEN {
        if mode.is_debug() {
            warn!(length, "JWT_SECRET shorter than {JWT_SECRET_MIN_LEN} bytes");
        } else {
            let mut value = value;
            zeroize::Zeroize::zeroize(&mut value);
            return Err(SettingsError::SecretTooShort {
                name: JWT_SECRET_ENV,
                length,
                min_len: JWT_SECRET_MIN_LEN,
            });
        }
    }
    Ok(JwtSecret::configured(value))
}

fn token_lifetime_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<TimeDelta, SettingsError> {
    let default = TimeDelta::days(7);
    let Some(value) = non_blank(env, JWT_EXPIRES_IN_ENV) else {
        return Ok(default);
    };
    match crate::outbound::security::parse_token_lifetime(&value) {
        Ok(lifetime) => Ok(lifetime),
        Err(_) => debug_warn_or_error(
            mode,
            default,
            SettingsError::InvalidEnv {
                name: JWT_EXPIRES_IN_ENV,
                value: value.clone(),
                expected: LIFETIME_EXPECTED,
            },
            || warn!(value = %value, "invalid JWT_EXPIRES_IN; using {DEFAULT_TOKEN_LIFETIME}"),
        ),
    }
}

fn storage_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Option<S3Settings>, SettingsError> {
    let bucket = required_in_release(env, mode, S3_BUCKET_ENV, "in-memory object store")?;
    Ok(bucket.map(|bucket| S3Settings {
        bucket,
        region: non_blank(env, S3_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_owned()),
        endpoint: non_blank(env, S3_ENDPOINT_ENV),
    }))
}
