//! Proxy server setup and accept loop.
//!
//! # Responsibilities
//! - Own the response cache shared by all handlers
//! - Accept connections and spawn one handler task per connection
//! - Contain per-connection failures; the loop outlives every handler
//! - Drain in-flight connections on shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::cache::ResponseCache;
use crate::config::{ProxyConfig, TimeoutConfig};
use crate::http::handler::{self, Outcome};
use crate::net::{ConnectionTracker, Listener};
use crate::observability::metrics;

/// State shared with every connection handler.
pub struct ProxyState {
    /// The one piece of state with process lifetime.
    pub cache: Arc<ResponseCache>,
    pub timeouts: TimeoutConfig,
}

/// The forwarding proxy server.
pub struct ProxyServer {
    config: ProxyConfig,
    cache: Arc<ResponseCache>,
}

impl ProxyServer {
    /// Create a server, constructing its cache from the configured caps.
    pub fn new(config: ProxyConfig) -> Self {
        let cache = Arc::new(ResponseCache::new(&config.cache));
        Self { config, cache }
    }

    /// Handle to the server's cache, for diagnostics and tests.
    pub fn cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.cache)
    }

    /// Run the accept loop until the shutdown signal fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Proxy server accepting connections");

        let tracker = ConnectionTracker::new();
        let state = Arc::new(ProxyState {
            cache: Arc::clone(&self.cache),
            timeouts: self.config.timeouts.clone(),
        });

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            // One failed accept must not take the loop down.
                            tracing::error!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let guard = tracker.track();
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let _permit = permit;
                        let id = guard.id();
                        match handler::handle_connection(&state, stream, peer).await {
                            Ok(outcome) => {
                                metrics::record_request(outcome.label());
                                log_outcome(&outcome, id, peer);
                            }
                            Err(e) => {
                                metrics::record_request("client_error");
                                tracing::warn!(
                                    connection_id = %id,
                                    peer_addr = %peer,
                                    error = %e,
                                    "Connection handler failed"
                                );
                            }
                        }
                        drop(guard);
                    });
                }
            }
        }

        self.drain(&tracker).await;
        tracing::info!("Proxy server stopped");
        Ok(())
    }

    async fn drain(&self, tracker: &ConnectionTracker) {
        let active = tracker.active_count();
        if active == 0 {
            return;
        }
        tracing::info!(active, "Draining in-flight connections");

        let deadline = Duration::from_secs(self.config.timeouts.drain_secs);
        if tokio::time::timeout(deadline, tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain deadline passed, abandoning remaining connections"
            );
        }
    }
}

fn log_outcome(outcome: &Outcome, id: crate::net::ConnectionId, peer: std::net::SocketAddr) {
    match outcome {
        Outcome::NoRequest => {
            tracing::debug!(connection_id = %id, peer_addr = %peer, "Closed without a request");
        }
        Outcome::Rejected(reason) => {
            tracing::warn!(
                connection_id = %id,
                peer_addr = %peer,
                reason = %reason,
                "Request rejected"
            );
        }
        Outcome::CacheHit { bytes } => {
            tracing::debug!(connection_id = %id, peer_addr = %peer, bytes, "Served from cache");
        }
        Outcome::Relayed { bytes, cached } => {
            tracing::debug!(
                connection_id = %id,
                peer_addr = %peer,
                bytes,
                cached,
                "Relayed origin response"
            );
        }
        Outcome::UpstreamFailed { bytes } => {
            tracing::warn!(
                connection_id = %id,
                peer_addr = %peer,
                forwarded = bytes,
                "Closed after origin failure"
            );
        }
    }
}
