//! Accept loop and coordinated shutdown

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpListener};
use tokio::sync::watch;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use super::registry::SessionRegistry;
use crate::config::ServerConfig;
use crate::error::{ConfigurationError, ConnectionError};
use crate::session::{ScheduledEmitter, Session, SessionContext};

/// Pause after a failed accept so a persistent error does not spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Requests shutdown from another task
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Accepts connections and runs one isolated session per connection
pub struct ConnectionManager {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<SessionContext>,
    registry: SessionRegistry,
    shutdown_tx: Arc<watch::Sender<bool>>,
    next_id: AtomicU64,
    grace: Duration,
}

impl ConnectionManager {
    /// Resolve and bind the listening address
    pub async fn bind(
        config: &ServerConfig,
        ctx: Arc<SessionContext>,
    ) -> Result<Self, ConfigurationError> {
        let addr_text = config.listen_addr();
        let addr = lookup_host(&addr_text)
            .await
            .map_err(|e| ConfigurationError::InvalidAddress {
                addr: addr_text.clone(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ConfigurationError::InvalidAddress {
                addr: addr_text.clone(),
                reason: "no addresses resolved".to_string(),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ConnectionError::Bind {
                addr: addr_text.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ConnectionError::Bind {
                addr: addr_text,
                source,
            })?;

        let (shutdown_tx, _) = watch::channel(false);
        Ok(ConnectionManager {
            listener,
            local_addr,
            ctx,
            registry: SessionRegistry::new(),
            shutdown_tx: Arc::new(shutdown_tx),
            next_id: AtomicU64::new(1),
            grace: config.shutdown_grace(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    /// (id, peer) of every live session
    pub fn live_sessions(&self) -> Vec<(u64, SocketAddr)> {
        self.registry.sessions()
    }

    pub fn is_live(&self, session_id: u64) -> bool {
        self.registry.contains(session_id)
    }

    /// Start a session over `writer` and register it until it ends.
    ///
    /// Returns `None` once shutdown has begun; `writer` is dropped unused.
    pub fn spawn_session<W>(&self, writer: W, peer: SocketAddr) -> Option<u64>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let emitter = ScheduledEmitter::new(Session::new(id, peer), Arc::clone(&self.ctx));
        let shutdown = self.shutdown_tx.subscribe();
        let registry = self.registry.clone();

        let registered = self.registry.register(id, peer, move || {
            tokio::spawn(async move {
                let mut writer = writer;
                let report = emitter.run(&mut writer, shutdown).await;
                writer.shutdown().await.ok();
                registry.remove(report.session_id);
                debug!(
                    "Session {} deregistered after {} messages",
                    report.session_id, report.messages_sent
                );
            })
        });
        registered.then_some(id)
    }

    /// Accept connections until shutdown is requested
    pub async fn run(&self) {
        let mut shutdown = self.shutdown_tx.subscribe();
        info!("FIX mock server listening on {}", self.local_addr);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Client connected from {}", peer);
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!("Could not set TCP_NODELAY for {}: {}", peer, e);
                        }
                        if self.spawn_session(stream, peer).is_none() {
                            debug!("Refused {} during shutdown", peer);
                        }
                    }
                    Err(e) => {
                        error!("{}", ConnectionError::Accept(e));
                        sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        info!("Stopped accepting connections");
    }

    /// Stop accepting, signal every session, and wait for them to finish.
    ///
    /// Sessions still running after the grace period are aborted. The
    /// registry is closed in the same step, so a connection accepted
    /// concurrently is refused rather than left running.
    pub async fn shutdown(&self) {
        info!("Shutting down with {} live sessions", self.registry.len());
        self.shutdown_tx.send_replace(true);

        let deadline = Instant::now() + self.grace;
        for (id, mut handle) in self.registry.close() {
            if timeout_at(deadline, &mut handle).await.is_err() {
                warn!("Session {} did not stop within the grace period, aborting", id);
                handle.abort();
                handle.await.ok();
            }
        }

        info!("Server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fix::MessageKind;
    use crate::session::{EmissionSchedule, MemorySink};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct FailingWriter {
        accepted: usize,
        limit: usize,
    }

    impl AsyncWrite for FailingWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.accepted >= self.limit {
                return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
            }
            self.accepted += buf.iter().filter(|b| **b == b'\n').count();
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn manager(ticks: u32, sink: Arc<MemorySink>) -> ConnectionManager {
        let mut config = Config::default();
        config.server.port = 0;
        let schedule = EmissionSchedule::default()
            .with_tick_count(ticks)
            .with_tick_interval(Duration::from_millis(10));
        let ctx = SessionContext::with_schedule(schedule).with_sink(sink);
        ConnectionManager::bind(&config.server, Arc::new(ctx))
            .await
            .unwrap()
    }

    async fn wait_until_gone(manager: &ConnectionManager, id: u64) {
        for _ in 0..200 {
            if !manager.is_live(id) {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let manager = manager(1, Arc::new(MemorySink::new())).await;
        assert_ne!(manager.local_addr().port(), 0);
        assert!(manager.live_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_bind_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not a host name".to_string();
        let ctx = Arc::new(SessionContext::with_schedule(EmissionSchedule::default()));
        let result = ConnectionManager::bind(&config.server, ctx).await;
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_failure_deregisters_session() {
        let sink = Arc::new(MemorySink::new());
        let manager = manager(6, sink.clone()).await;
        let peer: SocketAddr = "127.0.0.1:41000".parse().unwrap();

        let id = manager
            .spawn_session(
                FailingWriter {
                    accepted: 0,
                    limit: 6,
                },
                peer,
            )
            .unwrap();
        wait_until_gone(&manager, id).await;

        assert!(!manager.is_live(id));
        let events = sink.events_for(id);
        assert_eq!(events.len(), 7);
        let heartbeats = events
            .iter()
            .filter(|e| e.kind == MessageKind::Heartbeat)
            .count();
        assert_eq!(heartbeats, 3);
    }

    #[tokio::test]
    async fn test_completed_session_deregisters() {
        let sink = Arc::new(MemorySink::new());
        let manager = manager(2, sink.clone()).await;
        let peer: SocketAddr = "127.0.0.1:41001".parse().unwrap();

        let id = manager.spawn_session(tokio::io::sink(), peer).unwrap();
        wait_until_gone(&manager, id).await;

        assert!(!manager.is_live(id));
        // logon + 2 heartbeats + 1 order + 1 execution
        assert_eq!(sink.events_for(id).len(), 5);
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let manager = manager(1000, Arc::new(MemorySink::new())).await;
        let peer: SocketAddr = "127.0.0.1:41002".parse().unwrap();

        let a = manager.spawn_session(tokio::io::sink(), peer).unwrap();
        let b = manager.spawn_session(tokio::io::sink(), peer).unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.live_sessions().len(), 2);

        manager.shutdown().await;
        assert!(manager.live_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_handle() {
        let manager = manager(1, Arc::new(MemorySink::new())).await;
        let handle = manager.shutdown_handle();
        assert!(!handle.is_triggered());
        handle.trigger();
        assert!(handle.is_triggered());
        // run returns at once when shutdown was already requested
        manager.run().await;
    }

    #[tokio::test]
    async fn test_spawn_after_shutdown_is_refused() {
        let sink = Arc::new(MemorySink::new());
        let manager = manager(1000, sink.clone()).await;
        let peer: SocketAddr = "127.0.0.1:41003".parse().unwrap();

        manager.spawn_session(tokio::io::sink(), peer).unwrap();
        manager.shutdown().await;

        // a connection accepted while shutdown runs must not outlive it
        assert!(manager.spawn_session(tokio::io::sink(), peer).is_none());
        assert!(manager.live_sessions().is_empty());
        let late_id = 2;
        assert!(sink.events_for(late_id).is_empty());
    }
}
