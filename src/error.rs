//! Error types for loading snapshots and configuration

use thiserror::Error;

/// Errors that can occur when loading a geometry snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse snapshot JSON: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Duplicate box id '{0}' in snapshot")]
    DuplicateId(String),
    #[error("Box id '{0}' is reserved for the container reference")]
    ReservedId(String),
}

/// Errors that can occur when loading an anchoring configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
