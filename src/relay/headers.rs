//! Response header selection for relayed streams.
//!
//! # Responsibilities
//! - Pick the upstream headers the caller's decoder needs
//! - Never pass framing or hop-by-hop headers through
//!
//! # Design Decisions
//! - Allow-list rather than deny-list: the upstream is a third party
//! - The body is re-framed by our server, so `content-length` and
//!   `transfer-encoding` from upstream are meaningless to the caller

use axum::http::header::{HeaderMap, HeaderName, CONTENT_TYPE};

/// Headers tied to a single connection or to the upstream's body framing.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Whether a header must not be copied from upstream to the caller.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Copy `content-type` plus every allowed header present upstream.
///
/// Repeated headers keep all their values, in upstream order.
pub fn select_forwarded(upstream: &HeaderMap, allowed: &[HeaderName]) -> HeaderMap {
    let mut forwarded = HeaderMap::new();

    let content_type = CONTENT_TYPE;
    let names = std::iter::once(&content_type).chain(allowed.iter());
    for name in names {
        if forwarded.contains_key(name) || is_hop_by_hop(name.as_str()) {
            continue;
        }
        for value in upstream.get_all(name) {
            forwarded.append(name.clone(), value.clone());
        }
    }

    forwarded
}
