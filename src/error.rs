//! Error types for the POCSAG receiver.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the receiver.
#[derive(Error, Debug)]
pub enum Error {
    /// Declared length does not describe the supplied buffer
    #[error("Invalid length {length} for a buffer of {available} bytes")]
    InvalidLength { length: i64, available: usize },

    /// Configuration rejected by validation
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// Baud rate outside the POCSAG set
    #[error("Unsupported baud rate: {0} (expected 512, 1200 or 2400)")]
    UnsupportedBaudRate(u32),

    /// Invalid parameter crossing the native boundary
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal invariant broken (poisoned lock, closed channel, ...)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid parameter error.
    pub fn param<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParam(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if the error was caused by the caller's input rather than the receiver.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLength { .. }
                | Self::InvalidConfig(_)
                | Self::UnsupportedBaudRate(_)
                | Self::InvalidParam(_)
                | Self::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_length_message() {
        let err = Error::InvalidLength {
            length: -3,
            available: 16,
        };
        assert_eq!(err.to_string(), "Invalid length -3 for a buffer of 16 bytes");
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_internal_is_not_caller_error() {
        assert!(!Error::internal("poisoned").is_caller_error());
        assert!(Error::config("bad").is_caller_error());
    }
}
