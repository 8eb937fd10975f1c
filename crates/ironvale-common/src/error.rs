//! Error types for Ironvale.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Top-level error type for Ironvale operations outside the simulation tick.
#[derive(Debug, Error)]
pub enum IronvaleError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: SchemaVersion,
        /// Actual version found
        actual: SchemaVersion,
    },
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Read(String),

    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Config file could not be written
    #[error("Failed to write config: {0}")]
    Write(String),

    /// A value is outside its allowed range
    #[error("Invalid config value for {key}: {reason}")]
    InvalidValue {
        /// Offending key
        key: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type alias for Ironvale operations.
pub type IronvaleResult<T> = Result<T, IronvaleError>;
