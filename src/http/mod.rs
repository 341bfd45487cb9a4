//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per connection)
//!     → handler.rs (request line → validate → cache lookup → relay)
//!     → request.rs / uri.rs (request-line split, header read, URI parse)
//!     → upstream transport fetches on a miss
//!     → response bytes to client, candidate into the cache
//! ```

pub mod handler;
pub mod request;
pub mod server;
pub mod uri;

pub use handler::{Outcome, RejectReason};
pub use server::ProxyServer;
pub use uri::{parse_absolute_uri, RequestTarget, UriError};
