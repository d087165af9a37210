//! Relay session lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Count active sessions and enforce the optional session limit
//! - Record how each session ended (logs + metrics) exactly once

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;
use crate::relay::error::RelayError;

/// Global atomic counter for session IDs.
/// Relaxed ordering is enough since only uniqueness matters.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// How a relay session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The upstream finished its body cleanly.
    Completed,
    /// The caller went away (or never waited for the upstream).
    ClientClosed,
    /// The upstream could not be reached or refused to stream.
    UpstreamUnreachable,
    /// The upstream connection failed after streaming began.
    UpstreamFailed,
    /// The upstream went silent for longer than the idle timeout.
    IdleTimeout,
    /// The server is shutting down.
    Shutdown,
}

impl SessionEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEnd::Completed => "completed",
            SessionEnd::ClientClosed => "client_closed",
            SessionEnd::UpstreamUnreachable => "upstream_unreachable",
            SessionEnd::UpstreamFailed => "upstream_failed",
            SessionEnd::IdleTimeout => "idle_timeout",
            SessionEnd::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks active relay sessions.
///
/// With a limit configured, a semaphore caps concurrent sessions and extra
/// callers are turned away instead of queued: an audio element would just
/// sit in "loading" otherwise.
#[derive(Debug)]
pub struct SessionRegistry {
    active: Arc<AtomicUsize>,
    limit: Option<(Arc<Semaphore>, usize)>,
}

impl SessionRegistry {
    /// Create a registry. `max_sessions == 0` means unlimited.
    pub fn new(max_sessions: usize) -> Self {
        let limit =
            (max_sessions > 0).then(|| (Arc::new(Semaphore::new(max_sessions)), max_sessions));
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            limit,
        }
    }

    /// Open a session. Returns a guard that closes it on drop.
    pub fn open(&self) -> Result<SessionGuard, RelayError> {
        let permit = match &self.limit {
            Some((semaphore, max)) => Some(
                semaphore
                    .clone()
                    .try_acquire_owned()
                    .map_err(|_| RelayError::Busy(*max))?,
            ),
            None => None,
        };

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_sessions(active);

        Ok(SessionGuard {
            id: SessionId::new(),
            started: Instant::now(),
            bytes: 0,
            end: None,
            active: Arc::clone(&self.active),
            _permit: permit,
        })
    }

    /// Current number of open sessions.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard that tracks one session's lifetime.
///
/// Dropping it without [`SessionGuard::close`] records the session as
/// closed by the client: that only happens when hyper drops the response
/// body or the handler future.
#[derive(Debug)]
pub struct SessionGuard {
    id: SessionId,
    started: Instant,
    bytes: u64,
    end: Option<SessionEnd>,
    active: Arc<AtomicUsize>,
    _permit: Option<OwnedSemaphorePermit>,
}

impl SessionGuard {
    /// Get this session's ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Bytes forwarded to the caller so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Account for a chunk forwarded to the caller.
    pub fn record_chunk(&mut self, len: usize) {
        self.bytes += len as u64;
        metrics::record_bytes(len);
    }

    /// End the session with an explicit outcome.
    pub fn close(mut self, end: SessionEnd) {
        self.end = Some(end);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let end = self.end.unwrap_or(SessionEnd::ClientClosed);
        let active = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        let elapsed = self.started.elapsed();

        metrics::set_active_sessions(active);
        metrics::record_session_end(end.as_str(), elapsed);

        tracing::info!(
            session_id = %self.id,
            outcome = %end,
            bytes = self.bytes,
            duration_ms = elapsed.as_millis() as u64,
            "Relay session closed"
        );
    }
}
