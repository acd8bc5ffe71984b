use thiserror::Error;

/// Errors from the fallible edges of the crate: configuration, telemetry
/// encoding, file output and logger setup. The tuning loop itself never fails.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, TuneError>;
