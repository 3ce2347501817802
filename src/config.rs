//! Fetch configuration with sensible defaults.
//!
//! [`FetchConfig`] controls request timeouts, the default User-Agent, the
//! post-request throttle and the retry [`BackoffPolicy`]. The defaults are
//! tuned for polite scraping of small catalog sites.

use std::time::Duration;

use crate::{Result, SearchError};

/// Default User-Agent sent when a request does not carry its own.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound on a single backoff delay.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(60);

/// Exponential backoff applied between transport-level retries.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Factor applied to the delay after every failed retry.
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with the given attempt count, base delay and multiplier.
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// Returns the delay to wait after the given failed attempt (1-based),
    /// capped at [`MAX_BACKOFF_DELAY`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF_DELAY)
            .min(MAX_BACKOFF_DELAY)
    }
}

/// Configuration for the resilient fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent applied when the request has none.
    pub user_agent: String,
    /// Pause taken after every successful request.
    pub throttle: Duration,
    /// Retry policy for transport failures.
    pub backoff: BackoffPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            throttle: Duration::from_millis(800),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the default User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the post-request throttle.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Sets the retry policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `timeout` must be non-zero
    /// - `backoff.max_attempts` must be greater than 0
    /// - `backoff.multiplier` must be finite and at least 1.0
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(SearchError::Config("timeout must be greater than 0".into()));
        }
        if self.backoff.max_attempts == 0 {
            return Err(SearchError::Config(
                "max_attempts must be greater than 0".into(),
            ));
        }
        if !self.backoff.multiplier.is_finite() || self.backoff.multiplier < 1.0 {
            return Err(SearchError::Config(
                "backoff multiplier must be a finite number of at least 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.throttle, Duration::from_millis(800));
        assert_eq!(config.backoff.max_attempts, 3);
        assert!(config.user_agent.contains("Mozilla/5.0"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn backoff_with_unit_multiplier_is_constant() {
        let policy = BackoffPolicy::new(5, Duration::from_millis(100), 1.0);
        assert_eq!(policy.delay_for(1), policy.delay_for(4));
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = FetchConfig::default().with_backoff(BackoffPolicy::new(
            0,
            Duration::from_secs(1),
            2.0,
        ));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = FetchConfig::default().with_timeout(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn shrinking_multiplier_rejected() {
        let config = FetchConfig::default().with_backoff(BackoffPolicy::new(
            3,
            Duration::from_secs(1),
            0.5,
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn infinite_multiplier_rejected() {
        let config = FetchConfig::default().with_backoff(BackoffPolicy::new(
            3,
            Duration::from_secs(2),
            f64::INFINITY,
        ));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("multiplier"));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = BackoffPolicy::new(u32::MAX, Duration::from_secs(2), 2.0);
        assert!(FetchConfig::default()
            .with_backoff(policy.clone())
            .validate()
            .is_ok());
        assert_eq!(policy.delay_for(64), MAX_BACKOFF_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), MAX_BACKOFF_DELAY);

        let unbounded = BackoffPolicy::new(3, Duration::from_secs(2), f64::INFINITY);
        assert_eq!(unbounded.delay_for(1), Duration::from_secs(2));
        assert_eq!(unbounded.delay_for(2), MAX_BACKOFF_DELAY);
    }

    #[test]
    fn zero_base_delay_stays_zero() {
        let policy = BackoffPolicy::new(10, Duration::ZERO, 10.0);
        assert_eq!(policy.delay_for(9), Duration::ZERO);
    }

    #[test]
    fn builder_chain() {
        let config = FetchConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("CustomBot/1.0")
            .with_throttle(Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "CustomBot/1.0");
        assert!(config.throttle.is_zero());
    }
}
