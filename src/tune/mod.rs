pub mod adjust;
pub mod event;
pub mod filter;
pub mod gains;
pub mod interfaces;
pub mod ramp;
pub mod session;

pub use adjust::Action;
pub use event::{EventStats, TuneState};
pub use filter::{FilterBank, LowPassFilter};
pub use gains::{Axis, GainSet};
pub use interfaces::{AxisParamStore, Clock, FixedWingParams, Gain, PidInfo, RateController};
pub use session::AutoTune;
