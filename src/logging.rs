//! Logging setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Set to `1` for JSON log lines.
pub const ENV_LOG_JSON: &str = "STOCKWATCH_LOG_JSON";

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG` (default `info`). Calling it twice is harmless.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(ENV_LOG_JSON)
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
