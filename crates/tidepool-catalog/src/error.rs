//! Error types for catalog services.

/// Result type for catalog service operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur in catalog service operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An entity with the same key already exists.
    #[error("{resource_type} {name} already exists")]
    AlreadyExists {
        /// Kind of entity.
        resource_type: &'static str,
        /// Conflicting key.
        name: String,
    },

    /// The request failed shape-specific validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the failed rule.
        message: String,
    },

    /// A referenced storage does not exist.
    #[error("storage {name} not found")]
    StorageNotFound {
        /// Storage name.
        name: String,
    },

    /// A referenced metastore does not exist.
    #[error("metastore {name} not found")]
    MetastoreNotFound {
        /// Metastore name.
        name: String,
    },

    /// The provider does not exist.
    #[error("provider {name} not found")]
    ProviderNotFound {
        /// Provider name.
        name: String,
    },

    /// A referenced internal table does not exist.
    #[error("table {name} not found in provider {provider}")]
    TableNotFound {
        /// Provider name.
        provider: String,
        /// Table name.
        name: String,
    },

    /// The share does not exist.
    #[error("share {name} not found")]
    ShareNotFound {
        /// Share name.
        name: String,
    },

    /// The schema does not exist in its share.
    #[error("schema {name} not found in share {share}")]
    SchemaNotFound {
        /// Share name.
        share: String,
        /// Schema name.
        name: String,
    },

    /// A lower-level catalog store error.
    #[error(transparent)]
    Store(tidepool_core::Error),
}

impl CatalogError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<tidepool_core::Error> for CatalogError {
    fn from(err: tidepool_core::Error) -> Self {
        match err {
            tidepool_core::Error::AlreadyExists {
                resource_type,
                name,
            } => Self::AlreadyExists {
                resource_type,
                name,
            },
            tidepool_core::Error::ResourceNotFound {
                resource_type: "storage",
                id,
            } => Self::StorageNotFound { name: id },
            tidepool_core::Error::ResourceNotFound {
                resource_type: "metastore",
                id,
            } => Self::MetastoreNotFound { name: id },
            tidepool_core::Error::ResourceNotFound {
                resource_type: "provider",
                id,
            } => Self::ProviderNotFound { name: id },
            tidepool_core::Error::ResourceNotFound {
                resource_type: "share",
                id,
            } => Self::ShareNotFound { name: id },
            tidepool_core::Error::InvalidInput(message) => Self::Validation { message },
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_lift_into_catalog_variants() {
        let lifted: CatalogError = tidepool_core::Error::already_exists("provider", "p1").into();
        assert!(matches!(
            lifted,
            CatalogError::AlreadyExists {
                resource_type: "provider",
                ..
            }
        ));

        let lifted: CatalogError =
            tidepool_core::Error::resource_not_found("metastore", "glue1").into();
        assert!(matches!(lifted, CatalogError::MetastoreNotFound { name } if name == "glue1"));

        let lifted: CatalogError = tidepool_core::Error::lock_poisoned().into();
        assert!(matches!(lifted, CatalogError::Store(_)));
    }
}
