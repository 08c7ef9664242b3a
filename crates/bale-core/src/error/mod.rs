//! Error types and result aliases for Bale operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Bale ecosystem with actionable error messages.

use thiserror::Error;

/// Unified error type for all Bale operations
#[derive(Error, Debug)]
pub enum BaleError {
    // Local precondition errors
    #[error("Authentication required: {hint}")]
    AuthenticationRequired { hint: String },

    #[error("Invalid registry URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to encode request body: {message}")]
    Encode { message: String },

    // Registry errors
    //
    // Display is the message alone so callers see the registry's own text
    // (e.g. "Package not found") without a wrapper prefix.
    #[error("{message}")]
    Registry { status: u16, message: String },

    #[error("Invalid registry response: {message}")]
    InvalidResponse { message: String },

    #[error("Failed to download package: {reason}")]
    Download { reason: String },

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Bale operations
pub type BaleResult<T> = Result<T, BaleError>;

impl BaleError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication-required error with a context hint
    pub fn authentication_required(hint: &str) -> Self {
        Self::AuthenticationRequired {
            hint: hint.to_string(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable by retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BaleError::Network { .. } | BaleError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            BaleError::AuthenticationRequired { .. } => {
                Some("Run 'bale login' to authenticate with the registry")
            }
            BaleError::Network { .. } => Some("Check your internet connection and try again"),
            BaleError::Registry { status, .. } if *status == 404 => {
                Some("Check the package name spelling or try searching the registry")
            }
            BaleError::Download { .. } => {
                Some("The tarball may have moved; refresh the package metadata and retry")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_displays_message_only() {
        let err = BaleError::Registry {
            status: 404,
            message: "Package not found".to_string(),
        };
        assert_eq!(err.to_string(), "Package not found");
    }

    #[test]
    fn test_authentication_required_display() {
        let err = BaleError::authentication_required("log in before publishing packages");
        assert_eq!(
            err.to_string(),
            "Authentication required: log in before publishing packages"
        );
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_recoverable_errors() {
        let network = BaleError::Network {
            message: "connection refused".to_string(),
            source: None,
        };
        assert!(network.is_recoverable());

        let registry = BaleError::Registry {
            status: 400,
            message: "bad request".to_string(),
        };
        assert!(!registry.is_recoverable());
    }
}
