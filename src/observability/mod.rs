//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
