//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Build the station client and session registry from config
//! - Serve until shutdown, ending relay sessions so connections drain

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::assets::asset_service;
use crate::http::health::{health_handler, HEALTH_PATH};
use crate::http::stream::stream_handler;
use crate::lifecycle::Shutdown;
use crate::relay::{BuildError, SessionRegistry, UpstreamClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub sessions: Arc<SessionRegistry>,
    /// Ends in-flight relay sessions; triggered when the server stops.
    pub shutdown: Arc<Shutdown>,
    pub idle_timeout: Option<Duration>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    sessions_shutdown: Arc<Shutdown>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, BuildError> {
        let upstream = Arc::new(UpstreamClient::new(&config.station, &config.timeouts)?);
        let sessions = Arc::new(SessionRegistry::new(config.relay.max_sessions));
        let sessions_shutdown = Arc::new(Shutdown::new());

        let idle_timeout = (config.relay.idle_timeout_secs > 0)
            .then(|| Duration::from_secs(config.relay.idle_timeout_secs));

        let state = AppState {
            upstream,
            sessions,
            shutdown: Arc::clone(&sessions_shutdown),
            idle_timeout,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            sessions_shutdown,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No request timeout layer: it would cut every stream short.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.relay.path, get(stream_handler))
            .route(HEALTH_PATH, get(health_handler))
            .fallback_service(asset_service(&config.assets))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            station = %self.config.station.name,
            upstream = %self.config.station.url,
            path = %self.config.relay.path,
            "HTTP server starting"
        );

        let sessions_shutdown = self.sessions_shutdown;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutting down, ending relay sessions");
                sessions_shutdown.trigger();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}
