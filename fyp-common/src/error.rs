//! Common error types for the FYP portal

use thiserror::Error;

/// Common result type for FYP portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the domain and client crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A status string that is not part of the document lifecycle
    #[error("Unknown document status: {0}")]
    UnknownStatus(String),

    /// A role string that is not one of the portal roles
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
