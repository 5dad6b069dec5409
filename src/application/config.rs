//! Reporter configuration.
//!
//! Configuration is validated when the reporter is built; an invalid value
//! stops construction instead of running with ambiguous semantics.

use std::time::Duration;

/// Environment variable holding the cooldown in minutes.
pub const ENV_COOLDOWN: &str = "SERENE_REPORTER_COOLDOWN";
/// Environment variable enabling diagnostics.
pub const ENV_DEBUG: &str = "SERENE_REPORTER_DEBUG";
/// Environment variable holding the per-identity user cap.
pub const ENV_MAX_TRACKED_USERS: &str = "SERENE_REPORTER_MAX_TRACKED_USERS";
/// Environment variable holding the global identity cap.
pub const ENV_MAX_TRACKED_ERRORS: &str = "SERENE_REPORTER_MAX_TRACKED_ERRORS";

/// Default cooldown: 30 minutes.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30 * 60);
/// Default per-identity user cap.
pub const DEFAULT_MAX_TRACKED_USERS: usize = 1000;
/// Default global identity cap.
pub const DEFAULT_MAX_TRACKED_ERRORS: usize = 1000;

/// Error returned when configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Cooldown must be greater than zero
    ZeroCooldown,
    /// Max tracked users must be greater than zero
    ZeroMaxTrackedUsers,
    /// Max tracked errors must be greater than zero
    ZeroMaxTrackedErrors,
    /// A configuration value could not be parsed
    InvalidValue {
        /// Name of the setting
        key: String,
        /// The rejected raw value
        value: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroCooldown => write!(f, "cooldown must be greater than 0"),
            ConfigError::ZeroMaxTrackedUsers => {
                write!(f, "max_tracked_users must be greater than 0")
            }
            ConfigError::ZeroMaxTrackedErrors => {
                write!(f, "max_tracked_errors must be greater than 0")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Throttling configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long further occurrences are suppressed after a report
    pub cooldown: Duration,
    /// Emit diagnostic events for every decision
    pub debug: bool,
    /// Cap of the affected-user set per identity
    pub max_tracked_users: usize,
    /// Cap of concurrently tracked identities
    pub max_tracked_errors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            debug: false,
            max_tracked_users: DEFAULT_MAX_TRACKED_USERS,
            max_tracked_errors: DEFAULT_MAX_TRACKED_ERRORS,
        }
    }
}

impl Config {
    /// Check that every bound is positive.
    ///
    /// # Errors
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown.is_zero() {
            return Err(ConfigError::ZeroCooldown);
        }
        if self.max_tracked_users == 0 {
            return Err(ConfigError::ZeroMaxTrackedUsers);
        }
        if self.max_tracked_errors == 0 {
            return Err(ConfigError::ZeroMaxTrackedErrors);
        }
        Ok(())
    }

    /// Load configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is malformed or a bound is not positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(raw) = lookup(ENV_COOLDOWN) {
            let minutes: u64 = parse_number(ENV_COOLDOWN, &raw)?;
            config.cooldown = Duration::from_secs(minutes.saturating_mul(60));
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug = parse_bool(ENV_DEBUG, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_TRACKED_USERS) {
            config.max_tracked_users = parse_number(ENV_MAX_TRACKED_USERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_TRACKED_ERRORS) {
            config.max_tracked_errors = parse_number(ENV_MAX_TRACKED_ERRORS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}
