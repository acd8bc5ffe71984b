use crate::tune::LowPassFilter;

// ---------------------------------------------------------------------------
// Output slew rate limiter
// ---------------------------------------------------------------------------

/// Cutoff of the filter applied to the raw output slew rate, Hz.
pub const SLEW_FILTER_HZ: f32 = 25.0;
/// Time constant of the peak slew rate decay, s.
pub const PEAK_DECAY_TAU: f32 = 1.0;
/// How hard the modifier cuts once the peak exceeds the limit.
pub const MODIFIER_GAIN: f32 = 1.5;
/// PID gains are never cut below this fraction.
pub const MIN_MODIFIER: f32 = 0.1;

/// Watches the P+D output for fast reversals and returns a gain modifier
/// that backs P and D off while the output slews faster than the limit.
#[derive(Debug, Clone)]
pub struct SlewLimiter {
    filter: LowPassFilter,
    last_output: Option<f32>,
    peak: f32,
    slew_rate: f32,
}

impl SlewLimiter {
    pub fn new(loop_rate_hz: f32) -> Self {
        Self {
            filter: LowPassFilter::new(loop_rate_hz, SLEW_FILTER_HZ),
            last_output: None,
            peak: 0.0,
            slew_rate: 0.0,
        }
    }

    /// Feed the latest P+D output. Returns the modifier in
    /// `[MIN_MODIFIER, 1]`. A non-positive `limit` disables limiting.
    pub fn modifier(&mut self, output: f32, limit: f32, dt: f32) -> f32 {
        let raw = match self.last_output {
            Some(last) if dt > 0.0 => (output - last).abs() / dt,
            _ => 0.0,
        };
        self.last_output = Some(output);
        self.slew_rate = self.filter.apply(raw);

        if self.slew_rate > self.peak {
            self.peak = self.slew_rate;
        } else {
            let decay = (dt / PEAK_DECAY_TAU).min(1.0);
            self.peak *= 1.0 - decay;
        }

        if limit <= 0.0 || self.peak <= limit {
            return 1.0;
        }
        (limit / (limit + MODIFIER_GAIN * (self.peak - limit))).clamp(MIN_MODIFIER, 1.0)
    }

    /// Filtered slew rate from the last call.
    pub fn slew_rate(&self) -> f32 {
        self.slew_rate
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.last_output = None;
        self.peak = 0.0;
        self.slew_rate = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.01;

    #[test]
    fn steady_output_is_not_limited() {
        let mut s = SlewLimiter::new(100.0);
        for _ in 0..100 {
            assert_eq!(s.modifier(10.0, 150.0, DT), 1.0);
        }
        assert_eq!(s.slew_rate(), 0.0);
    }

    #[test]
    fn chattering_output_is_cut_and_bounded() {
        let mut s = SlewLimiter::new(100.0);
        let mut m = 1.0;
        for k in 0..200 {
            let out = if k % 2 == 0 { 20.0 } else { -20.0 };
            m = s.modifier(out, 150.0, DT);
        }
        assert!(m < 0.5, "modifier {m}");
        assert!(m >= MIN_MODIFIER);
    }

    #[test]
    fn modifier_recovers_after_chatter_stops() {
        let mut s = SlewLimiter::new(100.0);
        for k in 0..100 {
            s.modifier(if k % 2 == 0 { 20.0 } else { -20.0 }, 150.0, DT);
        }
        let mut m = 0.0;
        for _ in 0..1000 {
            m = s.modifier(0.0, 150.0, DT);
        }
        assert_eq!(m, 1.0);
    }

    #[test]
    fn zero_limit_disables() {
        let mut s = SlewLimiter::new(100.0);
        for k in 0..100 {
            assert_eq!(s.modifier(if k % 2 == 0 { 20.0 } else { -20.0 }, 0.0, DT), 1.0);
        }
    }
}
