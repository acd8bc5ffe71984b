use serde::{Deserialize, Serialize};

use crate::tune::interfaces::{AxisParamStore, Gain, RateController};
use crate::tune::GainSet;

// ---------------------------------------------------------------------------
// Rate controller parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub imax: f32,
    pub slew_limit: f32, // deg/s of surface
}

impl PidGains {
    fn get(&self, gain: Gain) -> f32 {
        match gain {
            Gain::FeedForward => self.ff,
            Gain::P => self.p,
            Gain::I => self.i,
            Gain::D => self.d,
            Gain::IMax => self.imax,
            Gain::SlewLimit => self.slew_limit,
        }
    }

    fn set(&mut self, gain: Gain, value: f32) {
        match gain {
            Gain::FeedForward => self.ff = value,
            Gain::P => self.p = value,
            Gain::I => self.i = value,
            Gain::D => self.d = value,
            Gain::IMax => self.imax = value,
            Gain::SlewLimit => self.slew_limit = value,
        }
    }
}

/// Parameter table with a live copy the controller flies on and a durable
/// copy standing in for EEPROM.
#[derive(Debug, Clone)]
pub struct ParamTable {
    live: PidGains,
    durable: PidGains,
    durable_writes: usize,
}

impl ParamTable {
    pub fn new(gains: PidGains) -> Self {
        Self { live: gains, durable: gains, durable_writes: 0 }
    }

    pub fn live(&self) -> PidGains {
        self.live
    }

    pub fn durable(&self) -> PidGains {
        self.durable
    }

    pub fn durable_writes(&self) -> usize {
        self.durable_writes
    }
}

impl RateController for ParamTable {
    fn gain(&self, gain: Gain) -> f32 {
        self.live.get(gain)
    }

    fn set_gain(&mut self, gain: Gain, value: f32) {
        self.live.set(gain, value);
    }

    fn save_gain(&mut self, gain: Gain, value: f32) {
        self.live.set(gain, value);
        self.durable.set(gain, value);
        self.durable_writes += 1;
    }
}

// ---------------------------------------------------------------------------
// Rate shaping parameters
// ---------------------------------------------------------------------------

/// Durable time constant and max rates for one axis.
#[derive(Debug, Clone, Default)]
pub struct RateShapeStore {
    pub time_constant: f32,
    pub max_rate_pos: i16,
    pub max_rate_neg: i16,
    writes: usize,
}

impl RateShapeStore {
    pub fn from_gains(gains: &GainSet) -> Self {
        Self {
            time_constant: gains.time_constant,
            max_rate_pos: gains.max_rate_pos,
            max_rate_neg: gains.max_rate_neg,
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl AxisParamStore for RateShapeStore {
    fn save_time_constant(&mut self, value: f32) {
        self.time_constant = value;
        self.writes += 1;
    }

    fn save_max_rate_pos(&mut self, value: i16) {
        self.max_rate_pos = value;
        self.writes += 1;
    }

    fn save_max_rate_neg(&mut self, value: i16) {
        self.max_rate_neg = value;
        self.writes += 1;
    }
}
