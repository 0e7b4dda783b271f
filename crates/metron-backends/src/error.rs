//! Error types for metron-backends

use thiserror::Error;

/// Backend configuration error
#[derive(Debug, Error)]
pub enum Error {
    /// No backend is registered under this class name
    #[error("unknown backend class: {0}")]
    UnknownBackend(String),

    /// Options table did not match what the backend accepts
    #[error("invalid options for backend {class}: {message}")]
    InvalidOptions {
        /// Backend class as written in the configuration
        class: String,
        /// Detailed message
        message: String,
    },

    /// Configuration text could not be parsed
    #[error("failed to parse backend configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
