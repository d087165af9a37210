//! Static file serving for the player.
//!
//! Files under the asset root are served as-is; anything else gets the
//! entry page so client-side routes survive a reload.

use tower_http::services::{ServeDir, ServeFile};

use crate::config::AssetsConfig;

/// Service for the router's fallback.
pub fn asset_service(config: &AssetsConfig) -> ServeDir<ServeFile> {
    ServeDir::new(&config.root).fallback(ServeFile::new(config.index_path()))
}
