use serde::{Deserialize, Serialize};

/// Something flying the stick during a simulated session.
///
/// Implement this to script custom manoeuvres and pass it to
/// [`simulate_with`](super::simulate_with).
pub trait Pilot {
    /// Commanded attitude in degrees at `time`. `dt` is the loop period.
    fn attitude_command(&mut self, time: f64, dt: f64) -> f64;

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "unnamed"
    }
}

// ---------------------------------------------------------------------------
// Repeating doublet
// ---------------------------------------------------------------------------

/// Bank (or pitch) to `+angle`, back to level, to `-angle`, back to level,
/// forever. The stick moves at a finite rate so demands ramp in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickProgram {
    pub angle_deg: f64,
    /// Time held at each extreme, s.
    pub hold_s: f64,
    /// Time held level between extremes, s.
    pub pause_s: f64,
    /// Stick slew, deg/s of commanded attitude.
    pub stick_rate_deg_s: f64,
    #[serde(skip)]
    command: f64,
}

impl Default for StickProgram {
    fn default() -> Self {
        Self { angle_deg: 45.0, hold_s: 2.5, pause_s: 2.5, stick_rate_deg_s: 300.0, command: 0.0 }
    }
}

impl StickProgram {
    pub fn new(angle_deg: f64, hold_s: f64, pause_s: f64) -> Self {
        Self { angle_deg, hold_s, pause_s, ..Self::default() }
    }

    pub fn period(&self) -> f64 {
        2.0 * (self.hold_s + self.pause_s)
    }

    /// Where the stick is heading at `time`.
    pub fn target(&self, time: f64) -> f64 {
        let period = self.period();
        if period <= 0.0 {
            return 0.0;
        }
        let phase = time.rem_euclid(period);
        let half = self.hold_s + self.pause_s;
        if phase < self.hold_s {
            self.angle_deg
        } else if phase < half {
            0.0
        } else if phase < half + self.hold_s {
            -self.angle_deg
        } else {
            0.0
        }
    }

    pub fn with_limit(mut self, limit_deg: f64) -> Self {
        self.angle_deg = self.angle_deg.clamp(-limit_deg, limit_deg);
        self
    }
}

impl Pilot for StickProgram {
    fn attitude_command(&mut self, time: f64, dt: f64) -> f64 {
        let step = self.stick_rate_deg_s * dt;
        let target = self.target(time);
        self.command += (target - self.command).clamp(-step, step);
        self.command
    }

    fn reset(&mut self) {
        self.command = 0.0;
    }

    fn name(&self) -> &str {
        "doublet"
    }
}

// ---------------------------------------------------------------------------
// Attitude loop
// ---------------------------------------------------------------------------

/// Desired rate from attitude error, shaped by the session's time constant
/// and rate limits.
pub fn desired_rate(angle_err_deg: f32, time_constant: f32, max_rate_pos: i16, max_rate_neg: i16) -> f32 {
    let tau = time_constant.max(0.05);
    let mut rate = angle_err_deg / tau;
    if max_rate_pos > 0 {
        rate = rate.min(max_rate_pos as f32);
    }
    if max_rate_neg > 0 {
        rate = rate.max(-(max_rate_neg as f32));
    }
    rate
}
