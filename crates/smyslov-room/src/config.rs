//! Game tunables, with environment overrides.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Environment variable overriding the round length in seconds.
pub const ROUND_SECONDS_ENV: &str = "SMYSLOV_ROUND_SECONDS";
/// Environment variable overriding how many seconds before the deadline the
/// warning goes out.
pub const WARNING_SECONDS_ENV: &str = "SMYSLOV_WARNING_SECONDS";
/// Environment variable selecting the [`RejoinPolicy`].
pub const REJOIN_POLICY_ENV: &str = "SMYSLOV_REJOIN_POLICY";

const DEFAULT_ROUND_SECONDS: u64 = 60;
const DEFAULT_WARNING_SECONDS: u64 = 5;
const DEFAULT_MAX_NAME_LEN: usize = 20;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric variable did not parse.
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber {
        /// The variable name.
        var: &'static str,
        /// The raw value.
        value: String,
    },

    /// The rejoin policy is not recognised.
    #[error("unknown rejoin policy {0:?}, expected \"retain\" or \"reset\"")]
    InvalidPolicy(String),

    /// The warning would not fire before the deadline.
    #[error("warning lead {warning_secs}s must be shorter than the round ({round_secs}s)")]
    WarningAfterDeadline {
        /// Configured warning lead.
        warning_secs: u64,
        /// Configured round length.
        round_secs: u64,
    },
}

/// What happens to a player's round state when they reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejoinPolicy {
    /// Keep answers and readiness.
    #[default]
    Retain,
    /// Discard answers and readiness of the open round.
    Reset,
}

impl FromStr for RejoinPolicy {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "reset" => Ok(Self::Reset),
            _ => Err(ConfigError::InvalidPolicy(raw.to_owned())),
        }
    }
}

/// Runtime tunables shared by every room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Length of the answer window.
    pub round_duration: Duration,
    /// How long before the deadline not-ready players are warned.
    pub warning_lead: Duration,
    /// Longest display name, in characters.
    pub max_name_len: usize,
    /// Reconnect behaviour.
    pub rejoin_policy: RejoinPolicy,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(DEFAULT_ROUND_SECONDS),
            warning_lead: Duration::from_secs(DEFAULT_WARNING_SECONDS),
            max_name_len: DEFAULT_MAX_NAME_LEN,
            rejoin_policy: RejoinPolicy::Retain,
        }
    }
}

impl GameSettings {
    /// Reads overrides from the process environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the warning would
    /// not precede the deadline.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads overrides through `lookup` on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is malformed or the warning would
    /// not precede the deadline.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seconds = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
                None => Ok(default),
            }
        };
        let round_secs = seconds(ROUND_SECONDS_ENV, DEFAULT_ROUND_SECONDS)?;
        let warning_secs = seconds(WARNING_SECONDS_ENV, DEFAULT_WARNING_SECONDS)?;
        if warning_secs >= round_secs {
            return Err(ConfigError::WarningAfterDeadline {
                warning_secs,
                round_secs,
            });
        }
        let rejoin_policy = lookup(REJOIN_POLICY_ENV)
            .map(|raw| raw.parse::<RejoinPolicy>())
            .transpose()?
            .unwrap_or_default();

        let settings = Self {
            round_duration: Duration::from_secs(round_secs),
            warning_lead: Duration::from_secs(warning_secs),
            max_name_len: DEFAULT_MAX_NAME_LEN,
            rejoin_policy,
        };
        info!(
            round_secs,
            warning_secs,
            rejoin_policy = ?settings.rejoin_policy,
            "game settings loaded"
        );
        Ok(settings)
    }

    /// Delay from round start until the warning goes out.
    #[must_use]
    pub fn warning_delay(&self) -> Duration {
        self.round_duration.saturating_sub(self.warning_lead)
    }
}
