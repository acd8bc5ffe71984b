use crate::tune::interfaces::Clock;

/// Deterministic scheduler clock advanced one loop period at a time.
#[derive(Debug, Clone)]
pub struct SimClock {
    now_us: u64,
    loop_rate_hz: u16,
}

impl SimClock {
    pub fn new(loop_rate_hz: u16) -> Self {
        Self { now_us: 0, loop_rate_hz: loop_rate_hz.max(1) }
    }

    /// Loop period in microseconds.
    pub fn period_us(&self) -> u64 {
        1_000_000 / self.loop_rate_hz as u64
    }

    pub fn dt(&self) -> f64 {
        self.period_us() as f64 * 1e-6
    }

    pub fn tick(&mut self) {
        self.now_us += self.period_us();
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.now_us += ms * 1000;
    }

    pub fn seconds(&self) -> f64 {
        self.now_us as f64 * 1e-6
    }
}

impl Clock for SimClock {
    fn loop_rate_hz(&self) -> u16 {
        self.loop_rate_hz
    }

    fn millis(&self) -> u32 {
        (self.now_us / 1000) as u32
    }

    fn micros64(&self) -> u64 {
        self.now_us
    }
}
