//! Logging setup.
//!
//! `RUST_LOG` takes precedence over the configured level:
//! ```bash
//! RUST_LOG=luaparse_parser=trace luaparse check init.lua
//! ```

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: Once = Once::new();

/// Install the stderr subscriber. Only the first call takes effect.
pub fn init(level: &str) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .without_time()
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}
