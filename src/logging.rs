use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. Output goes to stderr because stdout
/// carries IPC responses. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
