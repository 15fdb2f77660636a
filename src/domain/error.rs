//! Error types for aptdesk.
//!
//! This module defines the centralized error type [`AptdeskError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.
//!
//! # Taxonomy
//!
//! The variants fall into the classes the list screens care about:
//!
//! - **Local validation** ([`AptdeskError::Validation`]): malformed filter input,
//!   a zero page size, a delete without confirmation. Corrected in place by the
//!   reducer and logged, never shown as a notification.
//! - **Network** ([`AptdeskError::Network`], [`AptdeskError::Api`],
//!   [`AptdeskError::Decode`]): the request did not produce usable data. Shown as
//!   an error notification while the cached collection stays untouched.
//! - **Auth** ([`AptdeskError::Auth`]): 401/403 from the API. Not handled locally;
//!   propagated to the session collaborator.

use thiserror::Error;

/// The main error type for aptdesk operations.
///
/// Most variants carry a description string; I/O errors wrap the underlying
/// `std::io::Error` using `#[from]` for automatic conversion.
///
/// # Examples
///
/// ```
/// use aptdesk::domain::AptdeskError;
///
/// fn validate_page_size(size: usize) -> Result<usize, AptdeskError> {
///     if size == 0 {
///         return Err(AptdeskError::Validation("page size must be at least 1".to_string()));
///     }
///     Ok(size)
/// }
///
/// assert!(validate_page_size(0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum AptdeskError {
    /// Client-side storage operation failed.
    ///
    /// Occurs when reading from or writing to the key-value store fails.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Theme parsing or application failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Communication with the background worker failed.
    ///
    /// Occurs when the request channel to the worker thread is closed or the
    /// worker could not be started.
    #[error("Worker communication error: {0}")]
    Worker(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local input was rejected.
    ///
    /// Raised for malformed filter values, zero page sizes and unconfirmed
    /// deletes. Callers correct these in place instead of surfacing them.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request never produced a response (connect failure, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The API rejected the bearer token.
    #[error("Authentication error (HTTP {status})")]
    Auth {
        /// HTTP status code, 401 or 403.
        status: u16,
    },

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the status reason when absent.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl AptdeskError {
    /// Returns `true` for 401/403 responses that must reach the session layer.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Returns `true` for errors caused by local input rather than the network.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short, user-facing reason used in notifications and bulk failure lists.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Network(message) | Self::Decode(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for AptdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A specialized `Result` type for aptdesk operations.
pub type Result<T> = std::result::Result<T, AptdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_flagged() {
        assert!(AptdeskError::Auth { status: 401 }.is_auth());
        assert!(!AptdeskError::Network("timed out".into()).is_auth());
    }

    #[test]
    fn api_reason_uses_server_message() {
        let err = AptdeskError::Api {
            status: 404,
            message: "Household not found".into(),
        };
        assert_eq!(err.reason(), "Household not found");
        assert_eq!(err.to_string(), "API error (HTTP 404): Household not found");
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: AptdeskError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, AptdeskError::Decode(_)));
    }
}
