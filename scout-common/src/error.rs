//! Common error types for scout

use thiserror::Error;

/// Common result type for scout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the scout crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input (seed, filter value, duration)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
