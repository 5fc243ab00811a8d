//! Request context extraction.

use axum::async_trait;
use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::header::HeaderName;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tidepool_core::model::Principal;

use crate::error::ApiError;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Header naming the caller of management routes.
pub const PRINCIPAL_HEADER: &str = "x-principal";

/// Per-request context derived from headers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing/correlation.
    pub request_id: String,
}

/// The caller of a management route, taken from the `X-Principal` header.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = header_string(&parts.headers, PRINCIPAL_HEADER).ok_or_else(|| {
            ApiError::Unauthorized {
                message: "missing X-Principal header".to_string(),
            }
        })?;
        let principal = Principal::new(raw).map_err(|e| ApiError::Unauthorized {
            message: format!("invalid X-Principal header: {e}"),
        })?;
        Ok(Self(principal))
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn add_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
}

/// Middleware that injects a request context and echoes the request ID.
pub async fn context_middleware(mut req: Request<Body>, next: Next) -> Response {
    let request_id = header_string(req.headers(), REQUEST_ID_HEADER)
        .unwrap_or_else(|| ulid::Ulid::new().to_string());
    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });
    let mut response = next.run(req).await;
    add_request_id_header(&mut response, &request_id);
    response
}
