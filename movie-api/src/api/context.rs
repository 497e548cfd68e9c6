//! Per-request context: path, request ID and cancellation

use std::convert::Infallible;

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::request_id::RequestId;
use tracing::Span;

use crate::AppState;

/// Success envelope wrapping every payload
#[derive(Debug, Serialize, Deserialize)]
pub struct StandardResponse<T> {
    pub path: String,
    pub request_id: String,
    pub data: T,
}

/// Extracted once per request by handlers
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub request_id: String,
    /// Child of the server shutdown token
    pub cancel: CancellationToken,
}

impl RequestContext {
    /// Wrap `data` in the standard envelope
    pub fn respond<T: Serialize>(self, data: T) -> Json<StandardResponse<T>> {
        Json(StandardResponse {
            path: self.path,
            request_id: self.request_id,
            data,
        })
    }
}

fn request_id_str(id: Option<&RequestId>) -> &str {
    id.and_then(|id| id.header_value().to_str().ok())
        .unwrap_or_default()
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self {
            path: parts.uri.path().to_string(),
            request_id: request_id_str(parts.extensions.get::<RequestId>()).to_string(),
            cancel: state.shutdown.child_token(),
        })
    }
}

/// Span for `TraceLayer`, tagged with the request ID
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id_str(request.extensions().get::<RequestId>()),
    )
}
