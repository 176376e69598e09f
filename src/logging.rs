//! Diagnostic output for the `bedscan` binary.
//!
//! Library code only emits `tracing` events; this module installs the
//! subscriber that prints them. Engine diagnostics arrive under the
//! [`ENGINE_LOG_TARGET`](crate::engine::ENGINE_LOG_TARGET) target.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "BEDSCAN_LOG";

const DEFAULT_DIRECTIVE: &str = "bedscan=info";

/// Build the filter from `BEDSCAN_LOG`, falling back to `fallback`.
pub fn filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(fallback.unwrap_or(DEFAULT_DIRECTIVE)))
}

/// Install a stderr subscriber. Calling this more than once is harmless.
pub fn initialize(fallback: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(filter(fallback))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}
