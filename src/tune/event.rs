use super::interfaces::PidInfo;

// ---------------------------------------------------------------------------
// Event segmentation states
// ---------------------------------------------------------------------------

/// Where the desired-rate signal currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TuneState {
    #[default]
    Idle,
    DemandPos,
    DemandNeg,
}

impl TuneState {
    pub fn code(self) -> u8 {
        match self {
            TuneState::Idle => 0,
            TuneState::DemandPos => 1,
            TuneState::DemandNeg => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Entry/exit levels for one tick, derived from the attitude limit and the
/// current rate shaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventThresholds {
    /// |desired rate| above which a demand starts, deg/s.
    pub enter: f32,
    /// |desired rate| below which a demand ends, deg/s.
    pub exit: f32,
    /// |attitude error| at or above which the pilot is demanding attitude, deg.
    pub attitude_demand: f32,
}

impl EventThresholds {
    pub fn new(att_limit_deg: f32, time_constant: f32, max_rate_pos: i16) -> Self {
        let enter = 0.6 * (att_limit_deg / time_constant).min(max_rate_pos as f32);
        Self {
            enter,
            exit: 0.25 * enter,
            attitude_demand: 0.3 * att_limit_deg,
        }
    }

    /// State the detector moves to given the filtered desired rate.
    pub fn next_state(&self, state: TuneState, desired_rate: f32, angle_err_deg: f32) -> TuneState {
        let in_att_demand = angle_err_deg.abs() >= self.attitude_demand;
        match state {
            TuneState::Idle => {
                if desired_rate > self.enter && in_att_demand {
                    TuneState::DemandPos
                } else if desired_rate < -self.enter && in_att_demand {
                    TuneState::DemandNeg
                } else {
                    TuneState::Idle
                }
            }
            TuneState::DemandPos if desired_rate < self.exit => TuneState::Idle,
            TuneState::DemandNeg if desired_rate > -self.exit => TuneState::Idle,
            s => s,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-event accumulators
// ---------------------------------------------------------------------------

/// Peaks gathered while a state is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventStats {
    pub min_actuator: f32,
    pub max_actuator: f32,
    pub min_rate: f32,
    pub max_rate: f32,
    pub min_target: f32,
    pub max_target: f32,
    pub max_p: f32,
    pub max_d: f32,
    pub min_dmod: f32,
    pub max_dmod: f32,
    pub max_slew_rate: f32,
}

impl Default for EventStats {
    fn default() -> Self {
        Self {
            min_actuator: 0.0,
            max_actuator: 0.0,
            min_rate: 0.0,
            max_rate: 0.0,
            min_target: 0.0,
            max_target: 0.0,
            max_p: 0.0,
            max_d: 0.0,
            min_dmod: 1.0,
            max_dmod: 0.0,
            max_slew_rate: 0.0,
        }
    }
}

impl EventStats {
    /// Fold one tick of filtered signals and raw controller terms.
    pub fn observe(&mut self, actuator: f32, actual_rate: f32, desired_rate: f32, info: &PidInfo) {
        self.max_actuator = self.max_actuator.max(actuator);
        self.min_actuator = self.min_actuator.min(actuator);
        self.max_rate = self.max_rate.max(actual_rate);
        self.min_rate = self.min_rate.min(actual_rate);
        self.max_target = self.max_target.max(desired_rate);
        self.min_target = self.min_target.min(desired_rate);
        self.max_p = self.max_p.max(info.p.abs());
        self.max_d = self.max_d.max(info.d.abs());
        self.min_dmod = self.min_dmod.min(info.dmod);
        self.max_dmod = self.max_dmod.max(info.dmod);
        self.max_slew_rate = self.max_slew_rate.max(info.slew_rate);
    }

    /// Clear the actuator and rate peaks at the start of a demand. The
    /// desired-rate peaks carry over from earlier events.
    pub fn begin_event(&mut self) {
        self.min_actuator = 0.0;
        self.max_actuator = 0.0;
        self.min_rate = 0.0;
        self.max_rate = 0.0;
    }

    /// Clear the controller-term peaks on a state change.
    pub fn reset_terms(&mut self) {
        self.min_dmod = 1.0;
        self.max_dmod = 0.0;
        self.max_slew_rate = 0.0;
        self.max_p = 0.0;
        self.max_d = 0.0;
    }

    pub fn peak_actuator_abs(&self) -> f32 {
        self.max_actuator.max(self.min_actuator.abs())
    }
}
