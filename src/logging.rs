//! Process-wide `tracing` subscriber.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber once. `RUST_LOG` overrides `default_level`.
///
/// Output goes to stderr so stdout stays usable for image bytes.
pub fn init(default_level: &str) {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .ok();
    });
}
