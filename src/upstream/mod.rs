//! Origin-facing transport subsystem.

pub mod transport;

pub use transport::{build_origin_request, connect, TransportError};
