//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → stream.rs  (GET /stream → relay)
//!     → health.rs  (GET /healthz)
//!     → assets.rs  (everything else: static files, index.html fallback)
//!     → Send to client
//! ```

pub mod assets;
pub mod health;
pub mod request;
pub mod server;
pub mod stream;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
