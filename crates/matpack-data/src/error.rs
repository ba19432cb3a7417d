//! Error types for matpack-data operations.

use thiserror::Error;

/// Result type alias for registry and archive operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during registry and archive operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Input or persisted state failed validation.
    #[error("validation error: {message}")]
    Validation {
        /// Description of what failed validation.
        message: String,
    },

    /// Composition, run, sub-run, or backing directory not found.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// Filesystem operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Serialization/deserialization of the persisted registry failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

impl DataError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<matpack_core::Error> for DataError {
    fn from(value: matpack_core::Error) -> Self {
        match value {
            matpack_core::Error::InvalidInput(message) => Self::Validation { message },
            matpack_core::Error::NotFound(message) => Self::NotFound { message },
            matpack_core::Error::ResourceNotFound { resource_type, id } => Self::NotFound {
                message: format!("{resource_type} not found: {id}"),
            },
            matpack_core::Error::Storage { message, .. } => Self::Storage { message },
            matpack_core::Error::Serialization { message } => Self::Serialization { message },
            matpack_core::Error::Internal { message } => Self::Storage { message },
        }
    }
}
