//! Tracker configuration
//!
//! Defines the timing parameters of a polling session: the grace period
//! before the first status query, the interval policy between queries and
//! the overall session timeout.

use std::time::Duration;

use crate::cadence::CadencePolicy;
use crate::error::TrackerError;

/// Shape of the wait between status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

impl std::str::FromStr for BackoffKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(BackoffKind::Fixed),
            "exponential" => Ok(BackoffKind::Exponential),
            other => Err(TrackerError::InvalidConfig(format!(
                "unknown backoff kind '{}', expected 'fixed' or 'exponential'",
                other
            ))),
        }
    }
}

/// Tracker configuration
///
/// Defaults suit virtual machine operations, which typically take tens of
/// seconds to complete.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Wait before the first status query
    pub initial_wait: Duration,

    /// Wait between status queries (initial wait for exponential backoff)
    pub poll_interval: Duration,

    /// Fixed or exponential intervals
    pub backoff: BackoffKind,

    /// Growth factor for exponential backoff
    pub backoff_factor: f64,

    /// Number of cycles after which the backoff stops growing
    pub backoff_max_retries: u32,

    /// Longest single wait for exponential backoff
    pub backoff_cap: Duration,

    /// Session timeout, measured from the start of the session
    pub timeout: Duration,
}

impl TrackerConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            initial_wait: Duration::from_secs(10),
            poll_interval: Duration::from_secs(15),
            backoff: BackoffKind::Fixed,
            backoff_factor: 2.0,
            backoff_max_retries: 5,
            backoff_cap: Duration::from_secs(60),
            timeout: Duration::from_secs(120), // 2 minutes
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - VMSCHED_INITIAL_WAIT_SECS (default: 10)
    /// - VMSCHED_POLL_INTERVAL_SECS (default: 15)
    /// - VMSCHED_BACKOFF (fixed | exponential, default: fixed)
    /// - VMSCHED_BACKOFF_FACTOR (default: 2.0)
    /// - VMSCHED_BACKOFF_MAX_RETRIES (default: 5)
    /// - VMSCHED_BACKOFF_CAP_SECS (default: 60)
    /// - VMSCHED_TIMEOUT_SECS (default: 120)
    pub fn from_env() -> Result<Self, TrackerError> {
        let defaults = Self::new();

        let backoff = match std::env::var("VMSCHED_BACKOFF") {
            Ok(value) => value.parse::<BackoffKind>()?,
            Err(_) => defaults.backoff,
        };

        Ok(Self {
            initial_wait: env_secs("VMSCHED_INITIAL_WAIT_SECS").unwrap_or(defaults.initial_wait),
            poll_interval: env_secs("VMSCHED_POLL_INTERVAL_SECS")
                .unwrap_or(defaults.poll_interval),
            backoff,
            backoff_factor: std::env::var("VMSCHED_BACKOFF_FACTOR")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(defaults.backoff_factor),
            backoff_max_retries: std::env::var("VMSCHED_BACKOFF_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(defaults.backoff_max_retries),
            backoff_cap: env_secs("VMSCHED_BACKOFF_CAP_SECS").unwrap_or(defaults.backoff_cap),
            timeout: env_secs("VMSCHED_TIMEOUT_SECS").unwrap_or(defaults.timeout),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval must be greater than 0"));
        }

        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than 0"));
        }

        if self.backoff == BackoffKind::Exponential {
            if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
                return Err(invalid("backoff_factor must be at least 1.0"));
            }

            if self.backoff_cap < self.poll_interval {
                return Err(invalid("backoff_cap cannot be shorter than poll_interval"));
            }
        }

        Ok(())
    }

    /// Cadence policy described by this configuration
    pub fn cadence(&self) -> CadencePolicy {
        match self.backoff {
            BackoffKind::Fixed => CadencePolicy::fixed(self.initial_wait, self.poll_interval),
            BackoffKind::Exponential => CadencePolicy::exponential(
                self.initial_wait,
                self.poll_interval,
                self.backoff_factor,
                self.backoff_max_retries,
                self.backoff_cap,
            ),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn invalid(message: &str) -> TrackerError {
    TrackerError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::Interval;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.initial_wait, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TrackerConfig::default();

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(15);

        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.timeout = Duration::from_secs(120);

        config.backoff = BackoffKind::Exponential;
        config.backoff_factor = 0.5;
        assert!(config.validate().is_err());

        config.backoff_factor = 2.0;
        config.backoff_cap = Duration::from_secs(5);
        assert!(config.validate().is_err());

        config.backoff_cap = Duration::from_secs(60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backoff_kind_parse() {
        assert_eq!("fixed".parse::<BackoffKind>().unwrap(), BackoffKind::Fixed);
        assert_eq!(
            "Exponential".parse::<BackoffKind>().unwrap(),
            BackoffKind::Exponential
        );
        assert!("jitter".parse::<BackoffKind>().is_err());
    }

    #[test]
    fn test_cadence_from_config() {
        let mut config = TrackerConfig::default();
        assert_eq!(
            config.cadence().interval,
            Interval::Fixed(Duration::from_secs(15))
        );

        config.backoff = BackoffKind::Exponential;
        let cadence = config.cadence();
        assert_eq!(cadence.initial_wait, Duration::from_secs(10));
        assert_eq!(cadence.delay_for(1), Duration::from_secs(30));
        assert_eq!(cadence.delay_for(2), Duration::from_secs(60));
    }
}
