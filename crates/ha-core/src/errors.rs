//! Unified error system for HomeAsisstan
//!
//! A single error enum shared across crates. Crate-local errors (token codec,
//! authentication flow, client transport) convert into it at their boundary so
//! the server maps exactly one type onto HTTP status codes.

use serde::{Deserialize, Serialize};

/// Unified error type for all HomeAsisstan operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum HaError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Missing, expired or revoked credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message describing the credential problem
        message: String,
    },

    /// Authenticated, but the role does not allow the operation
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the permission issue
        message: String,
    },

    /// Operation conflicts with current state
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message describing the conflict
        message: String,
    },

    /// Credential temporarily locked after repeated failures
    #[error("Locked: {message} (retry after {retry_after_secs}s)")]
    Locked {
        /// Error message describing what is locked
        message: String,
        /// Seconds until the lock lifts
        retry_after_secs: u64,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl HaError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a locked error
    pub fn locked(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::Locked {
            message: message.into(),
            retry_after_secs,
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "invalid",
            Self::NotFound { .. } => "not_found",
            Self::Unauthorized { .. } => "unauthorized",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Conflict { .. } => "conflict",
            Self::Locked { .. } => "locked",
            Self::Crypto { .. } => "crypto",
            Self::Serialization { .. } => "serialization",
            Self::Storage { .. } => "storage",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether the error was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Invalid { .. }
                | Self::NotFound { .. }
                | Self::Unauthorized { .. }
                | Self::PermissionDenied { .. }
                | Self::Conflict { .. }
                | Self::Locked { .. }
        )
    }
}

/// Standard Result type for HomeAsisstan operations
pub type Result<T> = std::result::Result<T, HaError>;

impl From<serde_json::Error> for HaError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for HaError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HaError::invalid("test message");
        assert!(matches!(err, HaError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
    }

    #[test]
    fn test_locked_display_includes_retry() {
        let err = HaError::locked("house pin", 900);
        assert_eq!(err.to_string(), "Locked: house pin (retry after 900s)");
        assert_eq!(err.code(), "locked");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = HaError::from(io_err);
        assert!(matches!(err, HaError::NotFound { .. }));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(HaError::unauthorized("x").is_client_error());
        assert!(HaError::conflict("x").is_client_error());
        assert!(!HaError::storage("x").is_client_error());
        assert!(!HaError::internal("x").is_client_error());
    }
}
