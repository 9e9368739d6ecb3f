//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),

    #[error("Invalid {0}: must be greater than zero")]
    NotPositive(&'static str),

    #[error("Sweep deadline must be shorter than the sweep interval")]
    DeadlineExceedsInterval,

    #[error("Unknown payment provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid {0}: must be an http(s) URL")]
    InvalidUrl(&'static str),
}
