use std::f32::consts::TAU;

// ---------------------------------------------------------------------------
// Single-pole low-pass filter
// ---------------------------------------------------------------------------

/// First-order IIR low-pass with a fixed sample rate.
///
/// The first sample after construction or [`reset`](Self::reset) seeds the
/// output directly, so a step already present at session start does not show
/// up as a slow rise.
#[derive(Debug, Clone, Default)]
pub struct LowPassFilter {
    cutoff_hz: f32,
    alpha: f32,
    output: f32,
    initialised: bool,
}

impl LowPassFilter {
    pub fn new(sample_hz: f32, cutoff_hz: f32) -> Self {
        let mut f = Self::default();
        f.set_cutoff_frequency(sample_hz, cutoff_hz);
        f
    }

    /// Recompute the smoothing factor. A non-positive cutoff or sample rate
    /// turns the filter into a pass-through.
    pub fn set_cutoff_frequency(&mut self, sample_hz: f32, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz;
        self.alpha = if cutoff_hz <= 0.0 || sample_hz <= 0.0 {
            1.0
        } else {
            let dt = 1.0 / sample_hz;
            let rc = 1.0 / (TAU * cutoff_hz);
            (dt / (dt + rc)).clamp(0.0, 1.0)
        };
    }

    pub fn apply(&mut self, sample: f32) -> f32 {
        if self.initialised {
            self.output += (sample - self.output) * self.alpha;
        } else {
            self.output = sample;
            self.initialised = true;
        }
        self.output
    }

    pub fn reset(&mut self) {
        self.output = 0.0;
        self.initialised = false;
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

// ---------------------------------------------------------------------------
// Filter bank used by a tuning session
// ---------------------------------------------------------------------------

pub const ACTUATOR_CUTOFF_HZ: f32 = 0.75;
pub const RATE_CUTOFF_HZ: f32 = 0.75;
pub const TARGET_CUTOFF_HZ: f32 = 4.0;

/// The per-event feed-forward smoother runs once per completed event, so it
/// is configured with a unit sample period. A 2 Hz cutoff at 1 Hz gives an
/// alpha of about 0.93: each new estimate almost replaces the old one, and
/// the ±FF step bound does most of the limiting.
pub const FF_SMOOTHER_CUTOFF_HZ: f32 = 2.0;
pub const FF_SMOOTHER_SAMPLE_HZ: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct FilterBank {
    pub actuator: LowPassFilter,
    pub rate: LowPassFilter,
    pub target: LowPassFilter,
    /// Smooths single-event FF estimates. Historically called a median
    /// filter; it is a low-pass like the others.
    pub ff: LowPassFilter,
}

impl FilterBank {
    pub fn new(loop_rate_hz: f32) -> Self {
        let mut bank = Self {
            actuator: LowPassFilter::default(),
            rate: LowPassFilter::default(),
            target: LowPassFilter::default(),
            ff: LowPassFilter::new(FF_SMOOTHER_SAMPLE_HZ, FF_SMOOTHER_CUTOFF_HZ),
        };
        bank.configure(loop_rate_hz);
        bank
    }

    /// Set cutoffs relative to the control loop rate.
    pub fn configure(&mut self, loop_rate_hz: f32) {
        self.actuator.set_cutoff_frequency(loop_rate_hz, ACTUATOR_CUTOFF_HZ);
        self.rate.set_cutoff_frequency(loop_rate_hz, RATE_CUTOFF_HZ);
        self.target.set_cutoff_frequency(loop_rate_hz, TARGET_CUTOFF_HZ);
    }

    pub fn reset(&mut self) {
        self.actuator.reset();
        self.rate.reset();
        self.target.reset();
        self.ff.reset();
    }
}
