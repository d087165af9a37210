//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file relays the built-in station.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The upstream station being relayed.
    pub station: StationConfig,

    /// Relay endpoint behavior (path, session limits, idle timeout).
    pub relay: RelaySettings,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Static asset serving for the player.
    pub assets: AssetsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream station definition.
///
/// Icecast hosts commonly reject requests that don't look like they came
/// from their own web player, hence the referer and browser user agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    /// Display name used in logs.
    pub name: String,

    /// Icecast stream URL.
    pub url: String,

    /// `Referer` sent upstream. Omitted when unset.
    pub referer: Option<String>,

    /// `User-Agent` sent upstream.
    pub user_agent: String,

    /// Skip certificate verification for this station's client only.
    pub accept_invalid_certs: bool,

    /// Upstream response headers copied to the caller in addition to
    /// `content-type`.
    pub forward_headers: Vec<String>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: "CNBC".to_string(),
            url: "https://radiokrug.ru/usa/CNBC/icecast.audio".to_string(),
            referer: Some("https://radiostationusa.fm/".to_string()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
            forward_headers: default_forward_headers(),
        }
    }
}

/// Desktop Chrome user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

fn default_forward_headers() -> Vec<String> {
    [
        "cache-control",
        "icy-br",
        "icy-description",
        "icy-genre",
        "icy-name",
        "icy-pub",
        "icy-url",
        "ice-audio-info",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Relay endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Path the stream is served on.
    pub path: String,

    /// Maximum concurrent relay sessions (0 = unlimited).
    pub max_sessions: usize,

    /// End a session when the upstream sends nothing for this long
    /// (0 = never).
    pub idle_timeout_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            path: "/stream".to_string(),
            max_sessions: 0,
            idle_timeout_secs: 30,
        }
    }
}

/// Timeout configuration for upstream operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout (TCP + TLS) in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream response head to arrive, in seconds.
    pub response_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            response_secs: 15,
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding the player's files.
    pub root: PathBuf,

    /// Entry page served for unmatched routes.
    pub index: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index: "index.html".to_string(),
        }
    }
}

impl AssetsConfig {
    /// Full path of the entry page.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.relay.path, "/stream");
        assert_eq!(config.relay.max_sessions, 0);
        assert!(config.station.accept_invalid_certs);
        assert_eq!(
            config.station.referer.as_deref(),
            Some("https://radiostationusa.fm/")
        );
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [station]
            url = "http://127.0.0.1:8000/live"
            accept_invalid_certs = false

            [relay]
            max_sessions = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.station.url, "http://127.0.0.1:8000/live");
        assert!(!config.station.accept_invalid_certs);
        assert_eq!(config.station.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.relay.max_sessions, 4);
        assert_eq!(config.relay.idle_timeout_secs, 30);
        assert_eq!(config.timeouts.connect_secs, 10);
    }

    #[test]
    fn index_path_joins_root() {
        let assets = AssetsConfig {
            root: PathBuf::from("public"),
            index: "app.html".to_string(),
        };
        assert_eq!(assets.index_path(), PathBuf::from("public").join("app.html"));
    }
}
