//! API error types and error response payloads.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tidepool_catalog::CatalogError;
use tidepool_sharing::SharingError;

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Stable error code identifier.
    pub error_code: String,
    /// Human readable message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request was invalid.
    #[error("{message}")]
    BadRequest {
        /// Human readable message.
        message: String,
    },
    /// Caller identity is missing or malformed.
    #[error("{message}")]
    Unauthorized {
        /// Human readable message.
        message: String,
    },
    /// Resource not found.
    #[error("{message}")]
    NotFound {
        /// Human readable message.
        message: String,
    },
    /// The route exists but not for this method.
    #[error("{message}")]
    MethodNotAllowed {
        /// Human readable message.
        message: String,
    },
    /// Resource already exists.
    #[error("{message}")]
    Conflict {
        /// Human readable message.
        message: String,
    },
    /// Feature is not supported by this deployment.
    #[error("{message}")]
    NotImplemented {
        /// Human readable message.
        message: String,
    },
    /// A table loader or signer failed.
    #[error("{message}")]
    BadGateway {
        /// Human readable message.
        message: String,
    },
    /// Service unavailable (retryable).
    #[error("{message}")]
    ServiceUnavailable {
        /// Human readable message.
        message: String,
    },
    /// Internal error.
    #[error("{message}")]
    Internal {
        /// Human readable message.
        message: String,
    },
}

impl ApiError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Returns the HTTP status and response body for this error.
    #[must_use]
    pub fn to_status_and_payload(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            Self::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "INVALID_PARAMETER_VALUE", message)
            }
            Self::Unauthorized { message } => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message),
            Self::NotFound { message } => {
                (StatusCode::NOT_FOUND, "RESOURCE_DOES_NOT_EXIST", message)
            }
            Self::MethodNotAllowed { message } => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", message)
            }
            Self::Conflict { message } => {
                (StatusCode::CONFLICT, "RESOURCE_ALREADY_EXISTS", message)
            }
            Self::NotImplemented { message } => {
                (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED", message)
            }
            Self::BadGateway { message } => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE", message),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                message,
            ),
            Self::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            }
        };
        (
            status,
            ErrorResponse {
                error_code: code.to_string(),
                message: message.clone(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = self.to_status_and_payload();
        if status.is_server_error() {
            tracing::warn!(status = %status, error_code = %payload.error_code, message = %payload.message, "request failed");
        }
        (status, axum::Json(payload)).into_response()
    }
}

impl From<tidepool_core::Error> for ApiError {
    fn from(err: tidepool_core::Error) -> Self {
        use tidepool_core::Error;
        let message = err.to_string();
        match err {
            Error::InvalidInput(_) | Error::InvalidPageToken { .. } => Self::BadRequest { message },
            Error::AlreadyExists { .. } => Self::Conflict { message },
            Error::ResourceNotFound { .. } => Self::NotFound { message },
            Error::Serialization { .. } | Error::Internal { .. } => Self::Internal { message },
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::AlreadyExists { .. } => Self::Conflict { message },
            CatalogError::Validation { .. } => Self::BadRequest { message },
            CatalogError::StorageNotFound { .. }
            | CatalogError::MetastoreNotFound { .. }
            | CatalogError::ProviderNotFound { .. }
            | CatalogError::TableNotFound { .. }
            | CatalogError::ShareNotFound { .. }
            | CatalogError::SchemaNotFound { .. } => Self::NotFound { message },
            CatalogError::Store(err) => err.into(),
        }
    }
}

impl From<SharingError> for ApiError {
    fn from(err: SharingError) -> Self {
        let message = err.to_string();
        match err {
            SharingError::BadRequest { .. }
            | SharingError::MalformedTimestamp { .. }
            | SharingError::Predicate(_) => Self::BadRequest { message },
            SharingError::NotImplemented { .. }
            | SharingError::UnsupportedStorage { .. }
            | SharingError::UnsupportedTableFormat { .. } => Self::NotImplemented { message },
            SharingError::Upstream { .. } => Self::BadGateway { message },
            SharingError::Catalog(err) => err.into(),
            SharingError::Core(err) => err.into(),
            SharingError::Internal { .. } => Self::Internal { message },
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::model::StorageType;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().to_status_and_payload().0
    }

    #[test]
    fn core_errors_map_to_client_and_server_statuses() {
        assert_eq!(
            status_of(tidepool_core::Error::InvalidPageToken {
                token: "x".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(tidepool_core::Error::already_exists("share", "sh1")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(tidepool_core::Error::lock_poisoned()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn catalog_reference_errors_are_not_found() {
        assert_eq!(
            status_of(CatalogError::ProviderNotFound {
                name: "p".to_string()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CatalogError::validation("bad uri")),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn sharing_errors_map_by_kind() {
        assert_eq!(
            status_of(SharingError::bad_request("both")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SharingError::NotImplemented {
                message: "cdf".to_string()
            }),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            status_of(SharingError::UnsupportedStorage {
                storage_type: StorageType::Abfs
            }),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            status_of(SharingError::upstream("loader down")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn payload_carries_code_and_message() {
        let (_, payload) = ApiError::not_found("share sh9 not found").to_status_and_payload();
        assert_eq!(payload.error_code, "RESOURCE_DOES_NOT_EXIST");
        assert_eq!(payload.message, "share sh9 not found");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["errorCode"], "RESOURCE_DOES_NOT_EXIST");
    }
}
