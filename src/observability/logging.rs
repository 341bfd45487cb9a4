//! Structured logging initialization.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level when set
//! - Initialized once at startup, before any subsystem logs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Initialize the tracing subscriber.
///
/// The default directive scopes the configured level to this crate so that
/// dependency noise stays at warn and above.
pub fn init_logging(config: &ObservabilityConfig) {
    let default_directive = format!("warn,caching_proxy={}", config.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_directive)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
