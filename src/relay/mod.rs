//! Stream relay subsystem.
//!
//! # Data Flow
//! ```text
//! GET /stream
//!     → session.rs (open session, optional limit)
//!     → upstream.rs (GET station URL with Referer/User-Agent)
//!     → headers.rs (content-type + pass-through headers)
//!     → body.rs (RelayStream: chunks → caller, idle/shutdown/failure)
//!     → session closed with its outcome
//! ```
//!
//! # Design Decisions
//! - One upstream connection per caller; nothing is shared or cached
//! - No automatic retry: the player restarts playback itself
//! - Failures before the first byte become a 500; after it, an aborted body

pub mod body;
pub mod error;
pub mod headers;
pub mod session;
pub mod upstream;

pub use body::RelayStream;
pub use error::{BuildError, RelayError};
pub use session::{SessionEnd, SessionGuard, SessionId, SessionRegistry};
pub use upstream::{UpstreamClient, UpstreamResponse};
