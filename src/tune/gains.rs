use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Axis identity
// ---------------------------------------------------------------------------

/// Which rate loop a session tunes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Roll,
    Pitch,
}

impl Axis {
    /// Wire value used in telemetry records.
    pub fn code(self) -> u8 {
        match self {
            Axis::Roll => 0,
            Axis::Pitch => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Roll => "roll",
            Axis::Pitch => "pitch",
        }
    }
}

// ---------------------------------------------------------------------------
// Tunable quantities for one axis
// ---------------------------------------------------------------------------

/// Snapshot of everything the autotuner adjusts on one axis.
///
/// `feed_forward`, `p`, `i`, `d` and `integrator_limit` mirror the live rate
/// controller. `time_constant` and the max rates belong to the tuner itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainSet {
    pub time_constant: f32, // s
    pub max_rate_pos: i16,  // deg/s
    pub max_rate_neg: i16,  // deg/s
    pub feed_forward: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub integrator_limit: f32,
}

impl Default for GainSet {
    fn default() -> Self {
        Self {
            time_constant: 0.5,
            max_rate_pos: 75,
            max_rate_neg: 0,
            feed_forward: 0.345,
            p: 0.08,
            i: 0.15,
            d: 0.0,
            integrator_limit: 0.666,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_wire_codes() {
        assert_eq!(Axis::Roll.code(), 0);
        assert_eq!(Axis::Pitch.code(), 1);
        assert_eq!(serde_json::to_string(&Axis::Pitch).unwrap(), "\"pitch\"");
    }
}
