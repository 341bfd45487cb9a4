//! Origin connection establishment and request translation.
//!
//! # Responsibilities
//! - Dial the origin server with a bounded connect timeout
//! - Rewrite the client's request into the HTTP/1.0 form sent upstream
//!
//! # Design Decisions
//! - The response is EOF-delimited; no Content-Length or chunked handling,
//!   so an established stream carries no read timeout
//! - Client headers are forwarded verbatim, terminator included

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

/// Why an origin fetch could not be started.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
}

/// Open a TCP connection to `host:port`, bounded by `timeout`.
///
/// The port is textual; a non-numeric port surfaces here as a connect
/// failure rather than a parse error.
pub async fn connect(host: &str, port: &str, timeout: Duration) -> Result<TcpStream, TransportError> {
    let addr = format!("{host}:{port}");
    match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(TransportError::Connect { addr, source }),
        Err(_) => Err(TransportError::ConnectTimeout { addr, timeout }),
    }
}

/// Build the byte-exact request sent to the origin.
///
/// The request line is rewritten to `METHOD PATH HTTP/1.0`; client header
/// lines follow verbatim and the header section always ends with one blank
/// line, even when the client sent no headers.
pub fn build_origin_request(method: &str, path: &str, headers: &[String]) -> String {
    let mut request = format!("{method} {path} HTTP/1.0\r\n");
    for header in headers {
        request.push_str(header);
    }
    request.push_str("\r\n");
    request
}
