use serde::{Deserialize, Serialize};

use super::gains::Axis;

// ---------------------------------------------------------------------------
// Collaborators injected into a tuning session
// ---------------------------------------------------------------------------

/// Parameters of the rate controller that the tuner reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gain {
    FeedForward,
    P,
    I,
    D,
    IMax,
    SlewLimit,
}

/// The live rate controller. It is the single source of truth for its gains.
///
/// `set_gain` changes the value the controller flies with. `save_gain` also
/// writes it to durable storage.
pub trait RateController {
    fn gain(&self, gain: Gain) -> f32;
    fn set_gain(&mut self, gain: Gain, value: f32);
    fn save_gain(&mut self, gain: Gain, value: f32);
}

/// Durable storage for the tuner-owned rate shaping parameters.
pub trait AxisParamStore {
    fn save_time_constant(&mut self, value: f32);
    fn save_max_rate_pos(&mut self, value: i16);
    fn save_max_rate_neg(&mut self, value: i16);
}

/// Scheduler timing. `millis` wraps like a 32-bit hardware counter.
pub trait Clock {
    fn loop_rate_hz(&self) -> u16;
    fn millis(&self) -> u32;
    fn micros64(&self) -> u64;
}

// ---------------------------------------------------------------------------
// Per-tick controller telemetry
// ---------------------------------------------------------------------------

/// What the rate controller computed on the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidInfo {
    pub target: f32, // deg/s
    pub actual: f32, // deg/s
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    /// Slew limiter modifier applied to the D term, in (0, 1].
    pub dmod: f32,
    /// Filtered output slew rate, same units as the slew limit.
    pub slew_rate: f32,
}

impl PidInfo {
    /// Surface demand excluding the integrator, after clipping the full
    /// output to +-45 degrees.
    pub fn clipped_actuator(&self) -> f32 {
        (self.ff + self.p + self.d + self.i).clamp(-45.0, 45.0) - self.i
    }
}

// ---------------------------------------------------------------------------
// Vehicle parameters
// ---------------------------------------------------------------------------

pub const MAX_AUTOTUNE_LEVEL: u8 = 11;

/// Read-only fixed-wing limits the tuner consults every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedWingParams {
    pub roll_limit_cd: i32,
    pub pitch_limit_max_cd: i32,
    pub pitch_limit_min_cd: i32,
    pub autotune_level: i32,
}

impl FixedWingParams {
    /// Attitude limit for the axis, degrees.
    pub fn attitude_limit_deg(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Roll => self.roll_limit_cd as f32 * 0.01,
            Axis::Pitch => {
                self.pitch_limit_max_cd.abs().min(self.pitch_limit_min_cd.abs()) as f32 * 0.01
            }
        }
    }

    pub fn level(&self) -> u8 {
        self.autotune_level.clamp(0, MAX_AUTOTUNE_LEVEL as i32) as u8
    }
}

impl Default for FixedWingParams {
    fn default() -> Self {
        Self {
            roll_limit_cd: 4500,
            pitch_limit_max_cd: 2000,
            pitch_limit_min_cd: -2500,
            autotune_level: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_limit_uses_smaller_magnitude() {
        let p = FixedWingParams::default();
        assert!((p.attitude_limit_deg(Axis::Pitch) - 20.0).abs() < 1e-6);
        assert!((p.attitude_limit_deg(Axis::Roll) - 45.0).abs() < 1e-6);
    }

    #[test]
    fn level_is_clamped() {
        let mut p = FixedWingParams::default();
        p.autotune_level = 42;
        assert_eq!(p.level(), 11);
        p.autotune_level = -3;
        assert_eq!(p.level(), 0);
    }

    #[test]
    fn actuator_excludes_integrator_after_clip() {
        let info = PidInfo { ff: 40.0, p: 10.0, i: 5.0, ..PidInfo::default() };
        assert_eq!(info.clipped_actuator(), 40.0);
    }
}
