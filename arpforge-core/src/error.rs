//! Error types for arpforge

use thiserror::Error;

/// Result type alias for arpforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for arpforge
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected or missing configuration value
    #[error("Invalid configuration '{name}': {reason}")]
    Configuration { name: String, reason: String },

    /// The outbound device refused or failed a send
    #[error("Transmission failed: {0}")]
    Transmission(String),

    /// Operation not valid in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create a configuration error for a named parameter
    pub fn configuration<S: Into<String>>(name: S, reason: S) -> Self {
        Error::Configuration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a transmission error with a custom message
    pub fn transmission<S: Into<String>>(msg: S) -> Self {
        Error::Transmission(msg.into())
    }

    /// Create an invalid state error with a custom message
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Create a packet parsing error with a custom message
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        Error::PacketParsing(msg.into())
    }
}
