//! Tracing setup shared by whatever shell embeds the core.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize logging with the default `info` level. `RUST_LOG` overrides.
pub fn init() {
    init_with_level("info")
}

pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}
