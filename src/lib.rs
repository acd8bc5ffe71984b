pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod sim;
pub mod telemetry;
pub mod tune;

pub use config::TuneConfig;
pub use error::{Result, TuneError};
pub use logging::init_tracing;
pub use tune::{Action, AutoTune, Axis, GainSet};
