//! Error types for the hiveprobe dispatcher.
//!
//! Probe outcomes are kept distinguishable: a malformed address, a cancelled
//! scope and a contract violation on the request id never collapse into one
//! another.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type returned by probe operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The target address failed validation. Never retried.
    #[error("{0}")]
    MalformedAddress(#[from] MalformedAddressError),

    /// The probe's scope was cancelled before the endpoint became reachable.
    #[error("Probe cancelled: {reason}")]
    Cancelled {
        /// The reason recorded on the scope.
        reason: String,
    },

    /// The request id is already bound to an active operation.
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// The configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl ProbeError {
    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Returns true if this is a cancellation outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true if the address was rejected during validation.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedAddress(_))
    }

    /// Returns true for caller contract violations that must not be retried
    /// or ignored.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::DuplicateId { .. }))
    }

    /// Short machine-readable kind, carried as `kind` in the rejected and
    /// cancelled event payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedAddress(_) => "malformed_address",
            Self::Cancelled { .. } => "cancelled",
            Self::Registry(_) => "duplicate_id",
            Self::Config(_) => "config",
        }
    }
}

/// Why an address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    /// No `:port` suffix.
    MissingPort,
    /// An unbracketed host contains a colon.
    TooManyColons,
    /// Brackets are unbalanced or misplaced.
    UnexpectedBracket,
    /// The host is not a literal IP address.
    InvalidIp,
    /// The port is not a decimal number in `0..=65535`.
    InvalidPort,
}

impl MalformedReason {
    /// Returns the human-readable description.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingPort => "missing port in address",
            Self::TooManyColons => "too many colons in address",
            Self::UnexpectedBracket => "unexpected bracket in address",
            Self::InvalidIp => "invalid IP",
            Self::InvalidPort => "invalid port",
        }
    }
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a probe target is not a valid `ip:port` address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed address '{address}': {reason}")]
pub struct MalformedAddressError {
    /// The rejected input.
    pub address: String,
    /// What was wrong with it.
    pub reason: MalformedReason,
}

impl MalformedAddressError {
    /// Creates a new malformed address error.
    #[must_use]
    pub fn new(address: impl Into<String>, reason: MalformedReason) -> Self {
        Self {
            address: address.into(),
            reason,
        }
    }
}

/// Errors from the cancellation registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A second operation was started for an id that is still active.
    #[error("Duplicate request id {id}: an operation with this id is still active")]
    DuplicateId {
        /// The reused request id.
        id: u64,
    },
}

/// Error raised when a configuration is invalid.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("Invalid config field '{field}': {message}")]
    InvalidField {
        /// The field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The configuration document could not be parsed.
    #[error("Config parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_address_display() {
        let err = MalformedAddressError::new("not-an-ip:80", MalformedReason::InvalidIp);
        assert_eq!(err.to_string(), "Malformed address 'not-an-ip:80': invalid IP");
    }

    #[test]
    fn test_probe_error_classification() {
        let malformed: ProbeError =
            MalformedAddressError::new("x", MalformedReason::MissingPort).into();
        assert!(malformed.is_malformed());
        assert!(!malformed.is_cancelled());
        assert!(!malformed.is_fatal());

        let cancelled = ProbeError::cancelled("shutdown");
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.kind(), "cancelled");
        assert_eq!(malformed.kind(), "malformed_address");

        let duplicate: ProbeError = RegistryError::DuplicateId { id: 7 }.into();
        assert!(duplicate.is_fatal());
        assert!(duplicate.to_string().contains('7'));
    }

    #[test]
    fn test_config_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let config_err: ConfigError = err.into();
        assert!(matches!(config_err, ConfigError::Parse(_)));
    }
}
