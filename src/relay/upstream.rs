//! Outbound connection to the station.
//!
//! # Responsibilities
//! - Own the station's dedicated HTTP client (headers, TLS policy, timeouts)
//! - Open one upstream request per relay session
//! - Reject non-success upstream responses before any audio is relayed
//!
//! # Design Decisions
//! - Relaxed certificate validation lives on this client only; nothing else
//!   in the process shares it
//! - While relaxed, redirects are followed only within the station host
//! - No read timeout on the client: radio bodies never end. Stalls are
//!   handled per session by the idle timeout in `body.rs`

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use axum::http::StatusCode;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::redirect;
use url::Url;

use crate::config::{StationConfig, TimeoutConfig};
use crate::observability::metrics;
use crate::relay::error::{BuildError, RelayError};
use crate::relay::headers::select_forwarded;

const MAX_REDIRECTS: usize = 10;

/// Upstream body as a stream of chunks.
pub type UpstreamBody = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// An upstream response that is ready to relay.
pub struct UpstreamResponse {
    /// Upstream status (always a success status).
    pub status: StatusCode,
    /// Headers to copy to the caller.
    pub headers: HeaderMap,
    /// The audio bytes.
    pub body: UpstreamBody,
}

/// Client for a single configured station.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    name: String,
    url: Url,
    client: reqwest::Client,
    forward_headers: Vec<HeaderName>,
    response_timeout: Duration,
}

impl UpstreamClient {
    /// Build the station client from configuration.
    pub fn new(station: &StationConfig, timeouts: &TimeoutConfig) -> Result<Self, BuildError> {
        let url = Url::parse(&station.url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&station.user_agent).map_err(|source| {
                BuildError::InvalidHeaderValue {
                    name: "user-agent",
                    source,
                }
            })?,
        );
        if let Some(referer) = &station.referer {
            headers.insert(
                REFERER,
                HeaderValue::from_str(referer).map_err(|source| BuildError::InvalidHeaderValue {
                    name: "referer",
                    source,
                })?,
            );
        }

        let forward_headers = station
            .forward_headers
            .iter()
            .map(|name| HeaderName::from_bytes(name.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs));

        if station.accept_invalid_certs {
            let host = url.host_str().map(str::to_owned);
            tracing::warn!(
                station = %station.name,
                host = host.as_deref().unwrap_or("-"),
                "Certificate validation disabled for this station"
            );
            builder = builder
                .danger_accept_invalid_certs(true)
                .redirect(same_host_redirects(host));
        }

        Ok(Self {
            name: station.name.clone(),
            url,
            client: builder.build()?,
            forward_headers,
            response_timeout: Duration::from_secs(timeouts.response_secs),
        })
    }

    /// Station display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Station URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Open the upstream stream.
    ///
    /// Resolves once the response head has arrived; the body is left
    /// unread so the caller controls the pace.
    pub async fn open(&self) -> Result<UpstreamResponse, RelayError> {
        let send = self.client.get(self.url.clone()).send();

        let response = match tokio::time::timeout(self.response_timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                metrics::record_upstream_error("unreachable");
                return Err(RelayError::Unreachable(e));
            }
            Err(_) => {
                metrics::record_upstream_error("timeout");
                return Err(RelayError::Timeout(self.response_timeout));
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_error("status");
            return Err(RelayError::Status(status));
        }

        let headers = select_forwarded(response.headers(), &self.forward_headers);

        Ok(UpstreamResponse {
            status,
            headers,
            body: response.bytes_stream().boxed(),
        })
    }
}

/// Redirect policy that never leaves the station host.
fn same_host_redirects(host: Option<String>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if attempt.url().host_str() == host.as_deref() {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}
