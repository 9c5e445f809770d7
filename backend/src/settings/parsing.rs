//! Shared parsing helpers for settings.

use mockable::Env;
use tracing::warn;

use super::{BuildMode, SettingsError};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// A boolean variable and the value it takes when unset.
pub(super) struct BoolEnvConfig {
    name: &'static str,
    default_value: bool,
}

impl BoolEnvConfig {
    pub(super) const fn new(name: &'static str, default_value: bool) -> Self {
        Self {
            name,
            default_value,
        }
    }
}

/// Unset boolean variables take their default in every build mode; only
/// unparsable values are rejected in release.
pub(super) fn parse_bool_env<E: Env>(
    env: &E,
    mode: BuildMode,
    config: BoolEnvConfig,
) -> Result<bool, SettingsError> {
    let Some(value) = env.string(config.name) else {
        return Ok(config.default_value);
    };
    match parse_bool(&value) {
        Some(flag) => Ok(flag),
        None => debug_warn_or_error(
            mode,
            config.default_value,
            SettingsError::InvalidEnv {
                name: config.name,
                value: value.clone(),
                expected: BOOL_EXPECTED,
            },
            || {
                warn!(
                    value = %value,
                    "invalid {}; defaulting to {}",
                    config.name,
                    config.default_value
                );
            },
        ),
    }
}

pub(super) fn debug_warn_or_error<T, F>(
    mode: BuildMode,
    fallback: T,
    error: SettingsError,
    warn_fn: F,
) -> Result<T, SettingsError>
where
    F: FnOnce(),
{
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
