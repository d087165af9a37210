//! Relay error definitions.

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while building the station client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The station URL could not be parsed.
    #[error("invalid station URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A configured outbound header value is not valid.
    #[error("invalid value for header {name}")]
    InvalidHeaderValue {
        name: &'static str,
        #[source]
        source: axum::http::header::InvalidHeaderValue,
    },

    /// A forwarded header name is not valid.
    #[error("invalid forwarded header name: {0}")]
    InvalidHeaderName(#[from] axum::http::header::InvalidHeaderName),

    /// The HTTP client could not be constructed (TLS backend setup).
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors that end a relay request before any audio is sent.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connect, DNS, TLS or request failure.
    #[error("upstream unreachable: {0}")]
    Unreachable(reqwest::Error),

    /// The upstream accepted the connection but sent no response head in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {0}")]
    Status(StatusCode),

    /// The session limit is reached.
    #[error("session limit of {0} reached")]
    Busy(usize),
}

impl RelayError {
    /// Metric label for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Unreachable(_) => "unreachable",
            RelayError::Timeout(_) => "timeout",
            RelayError::Status(_) => "status",
            RelayError::Busy(_) => "busy",
        }
    }

    /// Short reason shown to the caller. Transport details stay in the logs.
    fn public_reason(&self) -> String {
        match self {
            RelayError::Unreachable(_) => "upstream unreachable".to_string(),
            RelayError::Timeout(_) => "upstream timed out".to_string(),
            RelayError::Status(status) => format!("upstream returned {status}"),
            RelayError::Busy(_) => "too many listeners".to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            RelayError::Busy(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Too many listeners".to_string(),
            ),
            ref other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching stream: {}", other.public_reason()),
            ),
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}
