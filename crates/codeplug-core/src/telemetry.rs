//! Tracing initialisation for binaries and tests embedding the core.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `CODEPLUG_LOG=codeplug_core=debug`.
pub const LOG_ENV: &str = "CODEPLUG_LOG";

static INIT: Once = Once::new();

/// Install a global fmt subscriber. Falls back to `default_filter` when
/// `CODEPLUG_LOG` is unset or invalid. Safe to call more than once.
pub fn init_tracing(default_filter: &str) {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    });
}
