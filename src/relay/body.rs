//! Relay body: forwards upstream chunks to the caller.
//!
//! # Responsibilities
//! - Yield upstream chunks unchanged and in order
//! - Account bytes against the session
//! - Turn upstream failure or silence into an aborted caller body
//! - End cleanly on server shutdown
//!
//! # Design Decisions
//! - Pull-based: hyper polls this stream only when the caller's socket can
//!   take more, so a slow listener pauses upstream reads (backpressure)
//! - Errors are surfaced as stream errors, never as bytes, so hyper drops
//!   the connection without a terminating chunk
//! - Dropping the stream drops the upstream body, which closes the
//!   outbound connection

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Bytes;
use futures_util::stream::Stream;
use tokio::time::{Instant, Sleep};

use crate::relay::session::{SessionEnd, SessionGuard};

/// Future that resolves when relaying must stop.
pub type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

struct IdleTimer {
    timeout: Duration,
    sleep: Pin<Box<Sleep>>,
}

/// Stream adapter between an upstream body and the caller's response.
pub struct RelayStream<S> {
    upstream: S,
    session: Option<SessionGuard>,
    idle: Option<IdleTimer>,
    shutdown: Option<ShutdownSignal>,
}

impl<S, E> RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    /// Wrap an upstream body for one session.
    pub fn new(upstream: S, session: SessionGuard) -> Self {
        Self {
            upstream,
            session: Some(session),
            idle: None,
            shutdown: None,
        }
    }

    /// Abort the stream when the upstream is silent for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle = Some(IdleTimer {
            timeout,
            sleep: Box::pin(tokio::time::sleep(timeout)),
        });
        self
    }

    /// End the stream cleanly once `signal` resolves.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    fn finish(&mut self, end: SessionEnd) {
        self.idle = None;
        self.shutdown = None;
        if let Some(session) = self.session.take() {
            session.close(end);
        }
    }
}

impl<S, E> Stream for RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let Some(session_id) = this.session.as_ref().map(SessionGuard::id) else {
            return Poll::Ready(None);
        };

        if let Some(shutdown) = this.shutdown.as_mut() {
            if shutdown.as_mut().poll(cx).is_ready() {
                tracing::info!(session_id = %session_id, "Ending relay session for shutdown");
                this.finish(SessionEnd::Shutdown);
                return Poll::Ready(None);
            }
        }

        match Pin::new(&mut this.upstream).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(session) = this.session.as_mut() {
                    session.record_chunk(chunk.len());
                }
                if let Some(idle) = this.idle.as_mut() {
                    idle.sleep.as_mut().reset(Instant::now() + idle.timeout);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::error!(
                    session_id = %session_id,
                    error = %e,
                    "Upstream failed mid-stream"
                );
                this.finish(SessionEnd::UpstreamFailed);
                Poll::Ready(Some(Err(io::Error::other(format!("upstream failed: {e}")))))
            }
            Poll::Ready(None) => {
                tracing::debug!(session_id = %session_id, "Upstream ended stream");
                this.finish(SessionEnd::Completed);
                Poll::Ready(None)
            }
            Poll::Pending => {
                let Some(idle) = this.idle.as_mut() else {
                    return Poll::Pending;
                };
                if idle.sleep.as_mut().poll(cx).is_pending() {
                    return Poll::Pending;
                }
                let timeout = idle.timeout;
                tracing::warn!(
                    session_id = %session_id,
                    idle_secs = timeout.as_secs(),
                    "Upstream idle, ending relay session"
                );
                this.finish(SessionEnd::IdleTimeout);
                Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("upstream idle for {timeout:?}"),
                ))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::session::SessionRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use futures_util::stream::{self, StreamExt};
    use tokio::sync::oneshot;

    fn chunks(parts: &[&'static str]) -> Vec<Result<Bytes, io::Error>> {
        parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect()
    }

    #[tokio::test]
    async fn forwards_chunks_in_order_then_ends() {
        let registry = SessionRegistry::new(0);
        let upstream = stream::iter(chunks(&["ab", "cde", "f"]));
        let relay = RelayStream::new(upstream, registry.open().unwrap());

        let out: Vec<_> = relay.map(|c| c.unwrap()).collect().await;
        assert_eq!(out, vec![Bytes::from("ab"), Bytes::from("cde"), Bytes::from("f")]);
        assert_eq!(registry.active(), 0);
    }

    #[tokio::test]
    async fn upstream_error_yields_one_error_then_ends() {
        let registry = SessionRegistry::new(0);
        let mut items = chunks(&["abc"]);
        items.push(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
        items.extend(chunks(&["never"]));
        let mut relay = RelayStream::new(stream::iter(items), registry.open().unwrap());

        assert_eq!(relay.next().await.unwrap().unwrap(), Bytes::from("abc"));
        assert!(relay.next().await.unwrap().is_err());
        assert!(relay.next().await.is_none());
        assert_eq!(registry.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_upstream_times_out() {
        let registry = SessionRegistry::new(0);
        let upstream = stream::iter(chunks(&["x"])).chain(stream::pending());
        let mut relay = RelayStream::new(upstream, registry.open().unwrap())
            .with_idle_timeout(Duration::from_secs(5));

        assert_eq!(relay.next().await.unwrap().unwrap(), Bytes::from("x"));

        let started = Instant::now();
        let err = relay.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(relay.next().await.is_none());
        assert_eq!(registry.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_reset_idle_timer() {
        let registry = SessionRegistry::new(0);
        let upstream = stream::iter(chunks(&["a", "b", "c"]))
            .then(|chunk| async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                chunk
            });
        let relay = RelayStream::new(Box::pin(upstream), registry.open().unwrap())
            .with_idle_timeout(Duration::from_secs(5));

        let out: Vec<_> = relay.collect().await;
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn shutdown_ends_stream_cleanly() {
        let registry = SessionRegistry::new(0);
        let (tx, rx) = oneshot::channel::<()>();
        let upstream = stream::iter(chunks(&["a"])).chain(stream::pending());
        let mut relay = RelayStream::new(upstream, registry.open().unwrap())
            .with_shutdown(Box::pin(async move {
                let _ = rx.await;
            }));

        assert_eq!(relay.next().await.unwrap().unwrap(), Bytes::from("a"));
        tx.send(()).unwrap();
        assert!(relay.next().await.is_none());
        assert_eq!(registry.active(), 0);
    }

    #[tokio::test]
    async fn pulls_one_upstream_chunk_per_read() {
        let registry = SessionRegistry::new(0);
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulls);
        let upstream = stream::poll_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Some(Ok::<_, io::Error>(Bytes::from_static(b"frame"))))
        });
        let mut relay = RelayStream::new(upstream, registry.open().unwrap())
            .with_idle_timeout(Duration::from_secs(5));

        for read in 1..=3 {
            relay.next().await.unwrap().unwrap();
            assert_eq!(pulls.load(Ordering::SeqCst), read);
        }

        // A reader that stops asking leaves the upstream unread.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
        assert_eq!(registry.active(), 1);
    }

    #[tokio::test]
    async fn dropping_stream_closes_session() {
        let registry = SessionRegistry::new(1);
        let upstream = stream::iter(chunks(&["a"])).chain(stream::pending());
        let mut relay = RelayStream::new(upstream, registry.open().unwrap());

        relay.next().await.unwrap().unwrap();
        assert_eq!(registry.active(), 1);

        drop(relay);
        assert_eq!(registry.active(), 0);
        assert!(registry.open().is_ok());
    }
}
