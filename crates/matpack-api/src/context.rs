//! Request context extraction.
//!
//! Every request carries a request ID for tracing/correlation, adopted from
//! the `x-request-id` header when present or minted otherwise. This service
//! has no authentication; the context exists purely for observability.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use ulid::Ulid;

use crate::error::ApiError;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing/correlation.
    pub request_id: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.get::<Self>() {
            return Ok(existing.clone());
        }

        let request_id = request_id_from_headers(&parts.headers)
            .unwrap_or_else(|| Ulid::new().to_string());

        let ctx = Self { request_id };
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
