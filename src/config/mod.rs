//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, PORT override)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to HttpServer::new, which builds the station client from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the relay runs without a file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_port_override, load_config, ConfigError};
pub use schema::{
    AssetsConfig, ListenerConfig, ObservabilityConfig, RelayConfig, RelaySettings, StationConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
