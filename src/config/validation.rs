//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the station URL and outbound header values
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;
use crate::http::health::HEALTH_PATH;
use crate::relay::headers::is_hop_by_hop;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("station.url: {0}")]
    InvalidStationUrl(String),

    #[error("{field}: not a valid header value")]
    InvalidHeaderValue { field: &'static str },

    #[error("station.user_agent: must not be empty")]
    EmptyUserAgent,

    #[error("station.forward_headers: '{0}' is not a valid header name")]
    InvalidHeaderName(String),

    #[error("station.forward_headers: '{0}' is a framing header and can't be forwarded")]
    HopByHopHeader(String),

    #[error(
        "relay.path: '{0}' must start with '/', avoid ':', '*', '{{' and '}}' captures, \
         and not clash with the health path"
    )]
    InvalidRelayPath(String),

    #[error("{field}: must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("observability.log_format: expected 'pretty' or 'json', got '{0}'")]
    UnknownLogFormat(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_bind_address(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    validate_station(config, &mut errors);

    let path = &config.relay.path;
    if !path.starts_with('/') || path == HEALTH_PATH || has_route_syntax(path) {
        errors.push(ValidationError::InvalidRelayPath(path.clone()));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "timeouts.connect_secs",
        });
    }
    if config.timeouts.response_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "timeouts.response_secs",
        });
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::UnknownLogFormat(
            observability.log_format.clone(),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `ip:port` or `host:port`. Names are resolved at bind time, not here.
fn is_bind_address(value: &str) -> bool {
    if value.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match value.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(|c: char| c.is_whitespace() || c == '/')
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

/// Captures and wildcards are router syntax and make route registration panic.
fn has_route_syntax(path: &str) -> bool {
    path.contains(['{', '}'])
        || path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}

fn validate_station(config: &RelayConfig, errors: &mut Vec<ValidationError>) {
    let station = &config.station;

    match Url::parse(&station.url) {
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::InvalidStationUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        Ok(url) if url.host_str().is_none() => {
            errors.push(ValidationError::InvalidStationUrl("missing host".into()));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidStationUrl(e.to_string())),
    }

    if station.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    } else if HeaderValue::from_str(&station.user_agent).is_err() {
        errors.push(ValidationError::InvalidHeaderValue {
            field: "station.user_agent",
        });
    }

    if let Some(referer) = &station.referer {
        if HeaderValue::from_str(referer).is_err() {
            errors.push(ValidationError::InvalidHeaderValue {
                field: "station.referer",
            });
        }
    }

    for name in &station.forward_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        } else if is_hop_by_hop(name) {
            errors.push(ValidationError::HopByHopHeader(name.clone()));
        }
    }
}
