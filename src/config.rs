//! Run configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default one-way travel allowance between consecutive events: 30 minutes.
pub const DEFAULT_TRAVEL_TIME_MS: i64 = 30 * 60 * 1000;

/// Default setup/teardown buffer around each event: 15 minutes.
pub const DEFAULT_BUFFER_TIME_MS: i64 = 15 * 60 * 1000;

/// How ranking advice should weigh risk against coverage.
///
/// Advisory only: the mode is forwarded to the ranking backend verbatim
/// and never changes feasibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    /// Prefer safe pairings; leave doubtful orders for later tiers.
    #[default]
    Conservative,
    /// Prefer coverage; accept tighter pairings.
    Aggressive,
}

impl StrategyMode {
    /// Wire name (snake_case tag).
    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyMode::Conservative => "conservative",
            StrategyMode::Aggressive => "aggressive",
        }
    }
}

/// Tunable parameters for an allocation run.
///
/// # Examples
///
/// ```
/// use u_dispatch::config::AllocatorConfig;
/// use std::time::Duration;
///
/// let config = AllocatorConfig::new()
///     .with_oracle_timeout(Duration::from_secs(5));
/// assert_eq!(config.margin_ms(), 45 * 60 * 1000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Travel allowance between consecutive events, in milliseconds.
    pub travel_time_ms: i64,
    /// Setup/teardown buffer around each event, in milliseconds.
    pub buffer_time_ms: i64,
    /// Hard deadline for one ranking consultation.
    #[serde(with = "duration_ms")]
    pub oracle_timeout: Duration,
    /// Risk posture forwarded to the ranking backend.
    pub strategy: StrategyMode,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            travel_time_ms: DEFAULT_TRAVEL_TIME_MS,
            buffer_time_ms: DEFAULT_BUFFER_TIME_MS,
            oracle_timeout: Duration::from_secs(10),
            strategy: StrategyMode::default(),
        }
    }
}

impl AllocatorConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the travel allowance.
    pub fn with_travel_time_ms(mut self, ms: i64) -> Self {
        self.travel_time_ms = ms;
        self
    }

    /// Sets the setup/teardown buffer.
    pub fn with_buffer_time_ms(mut self, ms: i64) -> Self {
        self.buffer_time_ms = ms;
        self
    }

    /// Sets the ranking consultation deadline.
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Sets the risk posture.
    pub fn with_strategy(mut self, strategy: StrategyMode) -> Self {
        self.strategy = strategy;
        self
    }

    /// Total separation margin applied around each event window.
    pub fn margin_ms(&self) -> i64 {
        self.travel_time_ms + self.buffer_time_ms
    }

    /// Checks parameter sanity.
    pub fn validate(&self) -> Result<(), String> {
        if self.travel_time_ms < 0 {
            return Err(format!(
                "travel_time_ms must be non-negative, got {}",
                self.travel_time_ms
            ));
        }
        if self.buffer_time_ms < 0 {
            return Err(format!(
                "buffer_time_ms must be non-negative, got {}",
                self.buffer_time_ms
            ));
        }
        if self.oracle_timeout.is_zero() {
            return Err("oracle_timeout must be positive".to_string());
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_margin_is_45_minutes() {
        let config = AllocatorConfig::default();
        assert_eq!(config.margin_ms(), 45 * 60 * 1000);
        assert_eq!(config.strategy, StrategyMode::Conservative);
    }

    #[test]
    fn test_builder_chain() {
        let config = AllocatorConfig::new()
            .with_travel_time_ms(10 * 60 * 1000)
            .with_buffer_time_ms(5 * 60 * 1000)
            .with_strategy(StrategyMode::Aggressive);

        assert_eq!(config.margin_ms(), 15 * 60 * 1000);
        assert_eq!(config.strategy, StrategyMode::Aggressive);
    }

    #[test]
    fn test_validate_rejects_negative_times() {
        let config = AllocatorConfig::new().with_travel_time_ms(-1);
        assert!(config.validate().is_err());

        let config = AllocatorConfig::new().with_buffer_time_ms(-1);
        assert!(config.validate().is_err());

        assert!(AllocatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = AllocatorConfig::new().with_oracle_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_wire_names() {
        assert_eq!(
            serde_json::to_string(&StrategyMode::Conservative).unwrap(),
            r#""conservative""#
        );
        assert_eq!(StrategyMode::Aggressive.as_str(), "aggressive");
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = AllocatorConfig::new().with_oracle_timeout(Duration::from_millis(2500));
        let json = serde_json::to_string(&config).unwrap();
        let back: AllocatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.oracle_timeout, Duration::from_millis(2500));
        assert_eq!(back.travel_time_ms, config.travel_time_ms);
    }
}
