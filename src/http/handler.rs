//! Per-connection request handling.
//!
//! # Responsibilities
//! - Drive one client connection from request line to closed sockets
//! - Serve cache hits without touching the origin
//! - Stream origin responses to the client while capturing a cache candidate
//!
//! # Design Decisions
//! - Rejected requests are closed with zero response bytes, no status line
//! - The cache is consulted by exact request URI before the URI is parsed
//! - Relay is chunk-by-chunk: the client sees bytes as they arrive, the
//!   capture fills alongside, and a mid-stream origin failure caches nothing
//! - Both sockets are owned by this function; every return path drops them

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::cache::ResponseCapture;
use crate::http::request::{self, RequestLine};
use crate::http::server::ProxyState;
use crate::http::uri::{parse_absolute_uri, UriError};
use crate::upstream;

/// Why a request was refused without a response.
#[derive(Debug, Error)]
pub enum RejectReason {
    #[error("missing or malformed request line")]
    MalformedRequestLine,

    #[error("unsupported method '{0}'")]
    UnsupportedMethod(String),

    #[error("request target is not an http:// URI")]
    UnsupportedScheme,

    #[error("malformed request target: {0}")]
    MalformedTarget(#[from] UriError),
}

/// How one connection ended.
#[derive(Debug)]
pub enum Outcome {
    /// The client connected but never sent a request line.
    NoRequest,
    /// The request was refused; the connection closed with no response bytes.
    Rejected(RejectReason),
    /// The cached response was written to the client.
    CacheHit { bytes: usize },
    /// The origin response was relayed to completion.
    Relayed { bytes: usize, cached: bool },
    /// The origin was unreachable or died mid-transfer; `bytes` were already
    /// forwarded and stay sent.
    UpstreamFailed { bytes: usize },
}

impl Outcome {
    /// Label for the per-outcome request counter.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NoRequest => "no_request",
            Outcome::Rejected(_) => "rejected",
            Outcome::CacheHit { .. } => "cache_hit",
            Outcome::Relayed { .. } => "relayed",
            Outcome::UpstreamFailed { .. } => "upstream_failed",
        }
    }
}

/// Handle one client connection end to end.
///
/// Returns `Err` only for client-side I/O failures; origin failures and
/// protocol rejections are reported through [`Outcome`].
pub async fn handle_connection(
    state: &ProxyState,
    stream: TcpStream,
    peer: SocketAddr,
) -> io::Result<Outcome> {
    let (read_half, mut client) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(Outcome::NoRequest);
    }

    let request_line = match RequestLine::parse(&line) {
        Some(request_line) => request_line,
        None => return Ok(Outcome::Rejected(RejectReason::MalformedRequestLine)),
    };

    if !request_line.method.eq_ignore_ascii_case("GET") {
        return Ok(Outcome::Rejected(RejectReason::UnsupportedMethod(
            request_line.method,
        )));
    }
    if !request_line.target.contains("http://") {
        return Ok(Outcome::Rejected(RejectReason::UnsupportedScheme));
    }

    // Exact-URI lookup before parsing; a hit needs neither the parsed target
    // nor the client's headers.
    if let Some(body) = state.cache.lookup(&request_line.target) {
        // Consume the rest of the request section so the close after the
        // response is clean rather than a reset.
        let _ = request::read_headers(&mut reader).await;
        client.write_all(&body).await?;
        client.shutdown().await.ok();
        return Ok(Outcome::CacheHit { bytes: body.len() });
    }

    let target = match parse_absolute_uri(&request_line.target) {
        Ok(target) => target,
        Err(e) => return Ok(Outcome::Rejected(RejectReason::MalformedTarget(e))),
    };

    let headers = request::read_headers(&mut reader).await?;

    tracing::debug!(
        peer_addr = %peer,
        uri = %request_line.target,
        host = %target.host,
        port = %target.port,
        "Fetching from origin"
    );

    let connect_timeout = Duration::from_secs(state.timeouts.connect_secs);
    let mut origin = match upstream::connect(&target.host, &target.port, connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(
                peer_addr = %peer,
                uri = %request_line.target,
                error = %e,
                "Origin connect failed"
            );
            return Ok(Outcome::UpstreamFailed { bytes: 0 });
        }
    };

    let translated =
        upstream::build_origin_request(&request_line.method, &target.path, &headers);
    if let Err(e) = origin.write_all(translated.as_bytes()).await {
        tracing::warn!(
            peer_addr = %peer,
            uri = %request_line.target,
            error = %e,
            "Failed to send request to origin"
        );
        return Ok(Outcome::UpstreamFailed { bytes: 0 });
    }

    // Streaming relay: each chunk reaches the client before the next read,
    // while the capture accumulates a cache candidate on the side.
    let mut capture = ResponseCapture::new(state.cache.max_object_bytes());
    let mut relayed = 0usize;
    let mut buf = [0u8; 8 * 1024];
    loop {
        match origin.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                client.write_all(&buf[..n]).await?;
                relayed += n;
                capture.extend(&buf[..n]);
            }
            Err(e) => {
                tracing::warn!(
                    peer_addr = %peer,
                    uri = %request_line.target,
                    relayed,
                    error = %e,
                    "Origin stream failed mid-transfer"
                );
                return Ok(Outcome::UpstreamFailed { bytes: relayed });
            }
        }
    }

    // Only a cleanly terminated response is a cache candidate.
    let cached = match capture.into_body() {
        Some(body) => state.cache.insert(&request_line.target, body),
        None => false,
    };

    client.shutdown().await.ok();
    Ok(Outcome::Relayed {
        bytes: relayed,
        cached,
    })
}
