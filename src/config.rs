use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TuneError};
use crate::sim::airframe::Airframe;
use crate::sim::params::PidGains;
use crate::sim::pilot::StickProgram;
use crate::tune::interfaces::MAX_AUTOTUNE_LEVEL;
use crate::tune::{Axis, FixedWingParams};

// ---------------------------------------------------------------------------
// Simulation settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub axis: Axis,
    pub loop_rate_hz: u16,
    pub duration_s: f64,
    /// Airspeed scaler handed to the controller and the tuner.
    pub scaler: f32,
    /// Keep one trace row every `trace_every` ticks.
    pub trace_every: usize,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self { axis: Axis::Roll, loop_rate_hz: 50, duration_s: 120.0, scaler: 1.0, trace_every: 1 }
    }
}

/// Rate shaping the session starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateShape {
    pub time_constant: f32,
    pub max_rate_pos: i16,
    pub max_rate_neg: i16,
}

impl Default for RateShape {
    fn default() -> Self {
        Self { time_constant: 0.5, max_rate_pos: 75, max_rate_neg: 75 }
    }
}

fn default_gains() -> PidGains {
    PidGains { ff: 0.1, p: 0.15, i: 0.05, d: 0.002, imax: 0.66, slew_limit: 150.0 }
}

/// Starting controller gains and rate shaping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialGains {
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub imax: f32,
    pub slew_limit: f32,
    #[serde(flatten)]
    pub shape: RateShape,
}

impl Default for InitialGains {
    fn default() -> Self {
        let g = default_gains();
        Self {
            ff: g.ff,
            p: g.p,
            i: g.i,
            d: g.d,
            imax: g.imax,
            slew_limit: g.slew_limit,
            shape: RateShape::default(),
        }
    }
}

impl InitialGains {
    pub fn pid(&self) -> PidGains {
        PidGains {
            ff: self.ff,
            p: self.p,
            i: self.i,
            d: self.d,
            imax: self.imax,
            slew_limit: self.slew_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuneConfig {
    pub vehicle: FixedWingParams,
    pub sim: SimSettings,
    pub airframe: Airframe,
    pub initial: InitialGains,
    pub pilot: StickProgram,
}

impl TuneConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: TuneConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let level = self.vehicle.autotune_level;
        if !(0..=MAX_AUTOTUNE_LEVEL as i32).contains(&level) {
            return Err(invalid(format!("vehicle.autotune_level must be 0..={MAX_AUTOTUNE_LEVEL}, got {level}")));
        }
        if self.vehicle.roll_limit_cd <= 0 {
            return Err(invalid("vehicle.roll_limit_cd must be > 0"));
        }
        if self.vehicle.pitch_limit_max_cd <= 0 || self.vehicle.pitch_limit_min_cd >= 0 {
            return Err(invalid("vehicle pitch limits must straddle zero"));
        }

        if self.sim.loop_rate_hz == 0 {
            return Err(invalid("sim.loop_rate_hz must be > 0"));
        }
        if !self.sim.duration_s.is_finite() || self.sim.duration_s <= 0.0 {
            return Err(invalid("sim.duration_s must be finite and > 0"));
        }
        if !self.sim.scaler.is_finite() || self.sim.scaler <= 0.0 {
            return Err(invalid("sim.scaler must be finite and > 0"));
        }
        if self.sim.trace_every == 0 {
            return Err(invalid("sim.trace_every must be > 0"));
        }

        let a = &self.airframe;
        if !(a.authority.is_finite() && a.authority > 0.0) {
            return Err(invalid("airframe.authority must be finite and > 0"));
        }
        if !(a.rate_tau.is_finite() && a.rate_tau > 0.0) {
            return Err(invalid("airframe.rate_tau must be finite and > 0"));
        }
        if !a.gust_amplitude.is_finite() || !a.gust_hz.is_finite() {
            return Err(invalid("airframe gust settings must be finite"));
        }

        let g = &self.initial;
        for (name, value) in [
            ("ff", g.ff),
            ("p", g.p),
            ("i", g.i),
            ("d", g.d),
            ("imax", g.imax),
            ("slew_limit", g.slew_limit),
            ("time_constant", g.shape.time_constant),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("initial.{name} must be finite and >= 0")));
            }
        }
        if g.shape.max_rate_pos < 0 || g.shape.max_rate_neg < 0 {
            return Err(invalid("initial max rates must be >= 0"));
        }

        let p = &self.pilot;
        if !(p.angle_deg.is_finite() && p.angle_deg > 0.0) {
            return Err(invalid("pilot.angle_deg must be finite and > 0"));
        }
        if !(p.hold_s.is_finite() && p.hold_s > 0.0) || !(p.pause_s.is_finite() && p.pause_s >= 0.0) {
            return Err(invalid("pilot hold_s must be > 0 and pause_s >= 0"));
        }
        if !(p.stick_rate_deg_s.is_finite() && p.stick_rate_deg_s > 0.0) {
            return Err(invalid("pilot.stick_rate_deg_s must be finite and > 0"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> TuneError {
    TuneError::InvalidConfig(msg.into())
}
