use super::params::{ParamTable, PidGains};
use super::slew::SlewLimiter;
use crate::tune::interfaces::{Gain, PidInfo, RateController};
use crate::tune::LowPassFilter;

// ---------------------------------------------------------------------------
// Rate PID (single axis)
// ---------------------------------------------------------------------------

/// Surface travel limit, degrees.
pub const SURFACE_LIMIT_DEG: f32 = 45.0;
/// Cutoff of the rate derivative filter, Hz.
pub const DERIVATIVE_CUTOFF_HZ: f32 = 10.0;

/// Rate controller with feed-forward, integrator limit and slew limiting.
/// Gains come from the wrapped [`ParamTable`] on every tick so changes made
/// by the tuner take effect immediately.
#[derive(Debug, Clone)]
pub struct RatePid {
    params: ParamTable,
    slew: SlewLimiter,
    derivative: LowPassFilter,
    integrator: f32,
    last_actual: Option<f32>,
}

impl RatePid {
    pub fn new(gains: PidGains, loop_rate_hz: f32) -> Self {
        Self {
            params: ParamTable::new(gains),
            slew: SlewLimiter::new(loop_rate_hz),
            derivative: LowPassFilter::new(loop_rate_hz, DERIVATIVE_CUTOFF_HZ),
            integrator: 0.0,
            last_actual: None,
        }
    }

    /// One control step. Returns the surface deflection in degrees and the
    /// breakdown the tuner consumes.
    pub fn update(&mut self, target: f32, actual: f32, scaler: f32, dt: f32) -> (f32, PidInfo) {
        let g = self.params.live();
        let err = target - actual;

        // derivative on measurement
        let rate_dot = match self.last_actual {
            Some(last) if dt > 0.0 => (actual - last) / dt,
            _ => 0.0,
        };
        self.last_actual = Some(actual);
        let rate_dot = self.derivative.apply(rate_dot);

        let ff = target * g.ff * scaler;
        let p_raw = err * g.p * scaler;
        let d_raw = -rate_dot * g.d * scaler;

        let dmod = self.slew.modifier(p_raw + d_raw, g.slew_limit, dt);
        let p = p_raw * dmod;
        let d = d_raw * dmod;

        let i_limit = g.imax * SURFACE_LIMIT_DEG;
        if g.i > 0.0 {
            self.integrator = (self.integrator + err * g.i * scaler * dt).clamp(-i_limit, i_limit);
        } else {
            self.integrator = 0.0;
        }
        let i = self.integrator;

        let surface = (ff + p + i + d).clamp(-SURFACE_LIMIT_DEG, SURFACE_LIMIT_DEG);
        let info = PidInfo {
            target,
            actual,
            ff,
            p,
            i,
            d,
            dmod,
            slew_rate: self.slew.slew_rate(),
        };
        (surface, info)
    }

    pub fn reset(&mut self) {
        self.slew.reset();
        self.derivative.reset();
        self.integrator = 0.0;
        self.last_actual = None;
    }

    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    pub fn integrator(&self) -> f32 {
        self.integrator
    }
}

impl RateController for RatePid {
    fn gain(&self, gain: Gain) -> f32 {
        self.params.gain(gain)
    }

    fn set_gain(&mut self, gain: Gain, value: f32) {
        self.params.set_gain(gain, value);
    }

    fn save_gain(&mut self, gain: Gain, value: f32) {
        self.params.save_gain(gain, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.01;

    fn gains() -> PidGains {
        PidGains { ff: 0.5, p: 0.2, i: 0.0, d: 0.0, imax: 0.5, slew_limit: 0.0 }
    }

    #[test]
    fn feed_forward_and_proportional() {
        let mut pid = RatePid::new(gains(), 100.0);
        let (surface, info) = pid.update(40.0, 10.0, 1.0, DT);
        assert!((info.ff - 20.0).abs() < 1e-5);
        assert!((info.p - 6.0).abs() < 1e-5);
        assert!((surface - 26.0).abs() < 1e-5);
        assert_eq!(info.dmod, 1.0);
    }

    #[test]
    fn output_is_clipped_to_surface_travel() {
        let mut pid = RatePid::new(PidGains { ff: 2.0, ..gains() }, 100.0);
        let (surface, info) = pid.update(100.0, 0.0, 1.0, DT);
        assert_eq!(surface, SURFACE_LIMIT_DEG);
        assert_eq!(info.clipped_actuator(), SURFACE_LIMIT_DEG);
    }

    #[test]
    fn integrator_is_limited_by_imax() {
        let mut pid = RatePid::new(PidGains { ff: 0.0, p: 0.0, i: 5.0, imax: 0.2, ..gains() }, 100.0);
        for _ in 0..1000 {
            pid.update(50.0, 0.0, 1.0, DT);
        }
        assert!((pid.integrator() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn gain_changes_apply_next_tick() {
        let mut pid = RatePid::new(gains(), 100.0);
        pid.set_gain(Gain::FeedForward, 1.0);
        let (_, info) = pid.update(10.0, 10.0, 1.0, DT);
        assert!((info.ff - 10.0).abs() < 1e-6);
        assert_eq!(pid.params().durable().ff, 0.5);
    }

    #[test]
    fn derivative_opposes_rate_change() {
        let mut pid = RatePid::new(PidGains { ff: 0.0, p: 0.0, d: 0.01, ..gains() }, 100.0);
        pid.update(0.0, 0.0, 1.0, DT);
        let (_, info) = pid.update(0.0, 10.0, 1.0, DT);
        assert!(info.d < 0.0);
    }
}
