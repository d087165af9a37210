//! The relay endpoint.
//!
//! Opens a session, connects to the station and answers with the station's
//! audio as a streaming body. Failures before the first byte become a
//! `text/plain` 500 (or 503 when the session limit is reached).

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{RelayError, RelayStream, SessionEnd, SessionId};

/// `GET /stream` handler.
pub async fn stream_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = request_id(&headers);

    let session = match state.sessions.open() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejecting relay request");
            metrics::record_rejected_session();
            return e.into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        session_id = %session.id(),
        station = %state.upstream.name(),
        "Relay session opened"
    );

    // Dropping this future (caller gone before the upstream answered) drops
    // the in-flight request and closes the session as client_closed.
    let upstream = match state.upstream.open().await {
        Ok(upstream) => upstream,
        Err(e) => {
            log_upstream_failure(request_id, session.id(), &e);
            session.close(SessionEnd::UpstreamUnreachable);
            return e.into_response();
        }
    };

    tracing::debug!(
        session_id = %session.id(),
        upstream_status = %upstream.status,
        content_type = ?upstream.headers.get(axum::http::header::CONTENT_TYPE),
        "Upstream connected, relaying"
    );

    let mut body = RelayStream::new(upstream.body, session).with_shutdown(state.shutdown.signal());
    if let Some(timeout) = state.idle_timeout {
        body = body.with_idle_timeout(timeout);
    }

    (StatusCode::OK, upstream.headers, Body::from_stream(body)).into_response()
}

fn log_upstream_failure(request_id: &str, session_id: SessionId, error: &RelayError) {
    match error {
        RelayError::Unreachable(source) => tracing::error!(
            request_id = %request_id,
            session_id = %session_id,
            error = %error,
            cause = ?source,
            "Stream error"
        ),
        _ => tracing::error!(
            request_id = %request_id,
            session_id = %session_id,
            error = %error,
            "Stream error"
        ),
    }
}
