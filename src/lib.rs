//! Internet radio relay.
//!
//! Relays a single icecast station to browsers that can't fetch it
//! directly (cross-origin, hotlink protection) and serves the player's
//! static files.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 RADIO RELAY                  │
//!   GET /stream          │  ┌─────────┐   ┌─────────┐   ┌───────────┐   │
//!   ─────────────────────┼─▶│  http   │──▶│ relay:: │──▶│  relay::  │───┼──▶ Icecast
//!                        │  │ server  │   │ session │   │ upstream  │   │    station
//!   audio bytes          │  └─────────┘   └─────────┘   └─────┬─────┘   │
//!   ◀────────────────────┼───────────── relay::body ◀─────────┘         │
//!                        │                                              │
//!   GET /anything-else   │  ┌─────────┐                                 │
//!   ─────────────────────┼─▶│ assets  │  ServeDir + index.html fallback │
//!                        │  └─────────┘                                 │
//!                        │  config · observability · lifecycle          │
//!                        └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
