//! Tracing initialization.
//!
//! Log verbosity follows `RUST_LOG` (standard `tracing` env-filter syntax,
//! e.g. `RUST_LOG=roster=debug,info`), defaulting to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
