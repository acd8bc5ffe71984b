pub mod airframe;
pub mod clock;
pub mod params;
pub mod pilot;
pub mod rate_pid;
pub mod runner;
pub mod slew;

pub use airframe::{rk4_step, Airframe, AxisState};
pub use pilot::{Pilot, StickProgram};
pub use runner::{simulate, simulate_with, SimOutcome, TraceRow};
