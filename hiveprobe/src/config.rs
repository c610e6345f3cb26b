//! Configuration for the liveness prober.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::Level;

/// Configuration for probe polling and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Delay between connection attempts in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Minimum gap between "checking address" log lines in milliseconds.
    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,
    /// Level used by the logging event sink ("debug" or "info").
    #[serde(default = "default_event_level")]
    pub event_level: String,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_log_interval_ms() -> u64 {
    1000
}

fn default_event_level() -> String {
    "info".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            log_interval_ms: default_log_interval_ms(),
            event_level: default_event_level(),
        }
    }
}

impl ProbeConfig {
    /// Creates a new probe configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_to_ms(interval);
        self
    }

    /// Sets the log interval.
    #[must_use]
    pub fn with_log_interval(mut self, interval: Duration) -> Self {
        self.log_interval_ms = duration_to_ms(interval);
        self
    }

    /// Sets the event level.
    #[must_use]
    pub fn with_event_level(mut self, level: impl Into<String>) -> Self {
        self.event_level = level.into();
        self
    }

    /// Gets the poll interval as Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Gets the log interval as Duration.
    #[must_use]
    pub fn log_interval(&self) -> Duration {
        Duration::from_millis(self.log_interval_ms)
    }

    /// Gets the event level as a tracing level.
    pub fn level(&self) -> Result<Level, ConfigError> {
        match self.event_level.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            other => Err(ConfigError::invalid_field(
                "event_level",
                format!("unsupported level '{other}', expected 'debug' or 'info'"),
            )),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_field(
                "poll_interval_ms",
                "must be greater than zero",
            ));
        }
        self.level()?;
        Ok(())
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::new();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.log_interval(), Duration::from_secs(1));
        assert_eq!(config.level().unwrap(), Level::INFO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ProbeConfig::new()
            .with_poll_interval(Duration::from_millis(20))
            .with_log_interval(Duration::from_millis(500))
            .with_event_level("debug");

        assert_eq!(config.poll_interval_ms, 20);
        assert_eq!(config.log_interval_ms, 500);
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = ProbeConfig::from_json(r#"{"poll_interval_ms": 50}"#).unwrap();
        pretty_assertions::assert_eq!(
            config,
            ProbeConfig {
                poll_interval_ms: 50,
                ..ProbeConfig::default()
            }
        );
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = ProbeConfig::from_json(r#"{"poll_interval_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "poll_interval_ms"));
    }

    #[test]
    fn test_unknown_level_rejected() {
        let config = ProbeConfig::new().with_event_level("trace");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ProbeConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
