//! TCP listener with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming client connections
//! - Enforce max_connections via semaphore
//! - Keep accepting through transient accept errors

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid bind address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[from] std::io::Error),
}

/// A bounded TCP listener that limits concurrent connections.
///
/// When `max_connections` handlers are in flight, `accept` waits for a slot
/// instead of accepting; the kernel backlog absorbs the burst.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr =
            config
                .bind_address
                .parse()
                .map_err(|source| ListenerError::InvalidAddress {
                    addr: config.bind_address.clone(),
                    source,
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;

        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Returns the stream, the peer address, and a permit that must be held
    /// for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .expect("connection semaphore is never closed");

        let (stream, addr) = self.inner.accept().await?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Local address this listener is bound to.
    ///
    /// Needed by tests binding port 0 and by startup logging.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

/// A permit representing a connection slot.
///
/// Dropping it returns the slot, even if the handler task panicked.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
