//! Error types for Tutorbot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Tutorbot operations
///
/// Covers configuration loading, generation provider calls, tool
/// execution and the feedback log.
#[derive(Error, Debug)]
pub enum TutorbotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, stream decoding, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Feedback log errors (bad turn index, unreadable log)
    #[error("Feedback error: {0}")]
    Feedback(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Tutorbot operations
///
/// Uses `anyhow::Error` as the error type so callers can attach context
/// while still downcasting to [`TutorbotError`] where it matters.
pub type Result<T> = anyhow::Result<T>;
