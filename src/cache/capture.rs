//! Bounded accumulation of a response while it is being relayed.

/// Accumulates origin response bytes up to a fixed cap.
///
/// The relay keeps feeding chunks regardless of capture state; once the cap
/// would be exceeded the buffer is discarded and the capture stays empty for
/// the rest of the transfer. The response then simply never reaches the cache.
#[derive(Debug)]
pub struct ResponseCapture {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl ResponseCapture {
    /// Create a capture that gives up beyond `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            overflowed: false,
        }
    }

    /// Append a relayed chunk to the capture.
    pub fn extend(&mut self, chunk: &[u8]) {
        if self.overflowed {
            return;
        }
        if self.buf.len() + chunk.len() > self.limit {
            self.overflowed = true;
            self.buf = Vec::new();
            return;
        }
        self.buf.extend_from_slice(chunk);
    }

    /// Whether the capture is still within the cacheable size cap.
    pub fn is_cacheable(&self) -> bool {
        !self.overflowed
    }

    /// Number of bytes currently captured.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Consume the capture, yielding the body if it stayed within the cap.
    pub fn into_body(self) -> Option<Vec<u8>> {
        if self.overflowed {
            None
        } else {
            Some(self.buf)
        }
    }
}
