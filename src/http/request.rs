//! Client request reading.
//!
//! # Responsibilities
//! - Split the request line into method and target
//! - Accumulate client header lines verbatim for forwarding
//!
//! # Design Decisions
//! - Header lines are kept exactly as received, CRLF included, so the
//!   origin sees what the client sent
//! - The header section is size-capped; a client streaming endless headers
//!   gets cut off instead of growing the accumulator forever

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Upper bound on the accumulated client header section.
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Method and target split out of a request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Method token as sent by the client.
    pub method: String,
    /// Request target, expected to be an absolute URI.
    pub target: String,
}

impl RequestLine {
    /// Split a request line on whitespace. Returns `None` when the method or
    /// target is missing; a trailing version token is accepted and ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?.to_string();
        Some(Self { method, target })
    }
}

/// Read client header lines until the blank-line terminator or stream end.
///
/// Lines are returned verbatim (terminators included) and the blank line
/// itself is consumed but not returned.
pub async fn read_headers<R>(reader: &mut R) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = Vec::new();
    let mut accumulated = 0usize;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            // Client closed before the blank line; forward what we have.
            break;
        }
        if line == "\r\n" {
            break;
        }
        accumulated += n;
        if accumulated > MAX_HEADER_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "client header section exceeds limit",
            ));
        }
        headers.push(line);
    }
    Ok(headers)
}
