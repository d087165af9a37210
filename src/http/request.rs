//! Request identification.
//!
//! # Responsibilities
//! - Name the request ID header used across the server
//! - Read the ID for log correlation
//!
//! # Design Decisions
//! - IDs are assigned (UUID v4) by tower-http's `SetRequestIdLayer` as early
//!   as possible and echoed back to the caller by `PropagateRequestIdLayer`

use axum::http::{HeaderMap, HeaderName};

/// Request ID header name.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request ID, or `"unknown"` when absent or not valid UTF-8.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
