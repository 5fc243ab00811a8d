//! Error types for sharing reads.

use tidepool_core::model::{StorageType, TableFormat};

/// Result type for sharing operations.
pub type SharingResult<T> = Result<T, SharingError>;

/// Errors that can occur while answering a sharing request.
#[derive(Debug, thiserror::Error)]
pub enum SharingError {
    /// The request is invalid on its face.
    #[error("bad request: {message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    /// A timestamp could not be parsed.
    #[error("malformed timestamp {value:?}: {source}")]
    MalformedTimestamp {
        /// The rejected text.
        value: String,
        /// Parser failure.
        #[source]
        source: chrono::ParseError,
    },

    /// The request asks for a feature that is not implemented.
    #[error("not implemented: {message}")]
    NotImplemented {
        /// Description of the unsupported feature.
        message: String,
    },

    /// The predicate hint is malformed or invalid.
    #[error(transparent)]
    Predicate(#[from] tidepool_predicate::PredicateError),

    /// No file signer exists for the storage type.
    #[error("file signing is not supported for {storage_type} storage")]
    UnsupportedStorage {
        /// Storage type of the table's provider.
        storage_type: StorageType,
    },

    /// No table loader is registered for the format.
    #[error("no table loader registered for {format} tables")]
    UnsupportedTableFormat {
        /// Format of the internal table.
        format: TableFormat,
    },

    /// A table loader or signer failed.
    #[error("upstream failure: {message}")]
    Upstream {
        /// Description of the failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A catalog service error.
    #[error(transparent)]
    Catalog(#[from] tidepool_catalog::CatalogError),

    /// A core error (catalog store, page token).
    #[error(transparent)]
    Core(#[from] tidepool_core::Error),

    /// The catalog references an entity that does not exist.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the inconsistency.
        message: String,
    },
}

impl SharingError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an upstream error with a source cause.
    #[must_use]
    pub fn upstream_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Upstream {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
