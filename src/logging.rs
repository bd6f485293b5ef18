//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initialise the global subscriber once.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (from
/// `[logging] level`) is used. Output goes to stderr so stdout stays clean
/// for `--format json|csv`.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
