use tracing_subscriber::EnvFilter;

use crate::error::{Result, TuneError};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` selects the filter (default `info`). `LOG_FORMAT=json` switches
/// to one JSON object per line; anything else gives the human-readable
/// format. Logs go to stderr so tables and data on stdout stay clean.
pub fn init_tracing() -> Result<()> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| TuneError::Logging(format!("tracing init failed: {e}")))
}
