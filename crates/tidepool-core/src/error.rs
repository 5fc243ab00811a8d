//! Error types and result aliases for Tidepool.
//!
//! This module defines the shared error types used by the catalog store, the
//! pagination engine, and entity constructors. Higher layers wrap these errors
//! in their own enums via `#[from]`.

use std::fmt;

/// The result type used throughout Tidepool core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Tidepool core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A continuation token could not be decoded.
    #[error("invalid page token: {token:?} is not a non-negative offset")]
    InvalidPageToken {
        /// The rejected token, verbatim.
        token: String,
    },

    /// An entity with the same key is already registered.
    #[error("{resource_type} {name} already exists")]
    AlreadyExists {
        /// The kind of entity (e.g. `storage`, `provider`).
        resource_type: &'static str,
        /// The conflicting key.
        name: String,
    },

    /// A parent entity required by the operation was not found.
    #[error("not found: {resource_type} {id}")]
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new already-exists error.
    #[must_use]
    pub fn already_exists(resource_type: &'static str, name: impl fmt::Display) -> Self {
        Self::AlreadyExists {
            resource_type,
            name: name.to_string(),
        }
    }

    /// Creates a new resource not found error.
    #[must_use]
    pub fn resource_not_found(resource_type: &'static str, id: impl fmt::Display) -> Self {
        Self::ResourceNotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates the error returned when a lock guarding shared state is poisoned.
    #[must_use]
    pub fn lock_poisoned() -> Self {
        Self::Internal {
            message: "lock poisoned".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_message_names_resource_and_key() {
        let err = Error::already_exists("storage", "s3store");
        assert_eq!(err.to_string(), "storage s3store already exists");
    }

    #[test]
    fn invalid_page_token_quotes_the_token() {
        let err = Error::InvalidPageToken {
            token: "abc".to_string(),
        };
        assert!(err.to_string().contains("\"abc\""));
    }
}
