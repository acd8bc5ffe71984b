use super::event::{EventStats, TuneState};
use super::filter::LowPassFilter;

// ---------------------------------------------------------------------------
// Tuning constants
// ---------------------------------------------------------------------------

/// Step sizes, percent.
pub const INCREASE_FF_STEP: f32 = 12.0;
pub const INCREASE_PD_STEP: f32 = 10.0;
pub const DECREASE_FF_STEP: f32 = 15.0;
pub const DECREASE_PD_STEP: f32 = 20.0;

/// Ratio of I to P.
pub const I_RATIO: f32 = 0.75;
/// Time constant of the rate trim loop, s.
pub const TRIM_TCONST: f32 = 1.0;
/// Achieved/desired rate ratio above which an event counts as overshoot.
pub const OVERSHOOT: f32 = 1.1;

pub const MIN_EVENT_MS: u32 = 100;
pub const MIN_P: f32 = 0.01;
pub const MIN_D: f32 = 0.0005;

// ---------------------------------------------------------------------------
// Decision tags
// ---------------------------------------------------------------------------

/// Last decision taken by the tuner, reported in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    None,
    LowRate,
    Short,
    RaisePd,
    LowerPd,
    IdleLowerPd,
}

impl Action {
    pub fn code(self) -> u8 {
        match self {
            Action::None => 0,
            Action::LowRate => 1,
            Action::Short => 2,
            Action::RaisePd => 3,
            Action::LowerPd => 4,
            Action::IdleLowerPd => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::None => "none",
            Action::LowRate => "low_rate",
            Action::Short => "short",
            Action::RaisePd => "raise_pd",
            Action::LowerPd => "lower_pd",
            Action::IdleLowerPd => "idle_lower_pd",
        }
    }

    pub const ALL: [Action; 6] = [
        Action::None,
        Action::LowRate,
        Action::Short,
        Action::RaisePd,
        Action::LowerPd,
        Action::IdleLowerPd,
    ];
}

/// Multiplier applied to P or D for a fixed decrease step.
pub fn decrease_pd_mul() -> f32 {
    (100.0 - DECREASE_PD_STEP) * 0.01
}

/// Map `value` from `[in_low, in_high]` onto `[out_low, out_high]`,
/// holding the end values outside the input range.
pub fn linear_interpolate(out_low: f32, out_high: f32, value: f32, in_low: f32, in_high: f32) -> f32 {
    if in_high <= in_low || value <= in_low {
        return out_low;
    }
    if value >= in_high {
        return out_high;
    }
    let p = (value - in_low) / (in_high - in_low);
    out_low + p * (out_high - out_low)
}

/// Clamp that never panics: NaN maps to the middle of the range, and the
/// bounds are not checked against each other.
pub fn constrain(value: f32, low: f32, high: f32) -> f32 {
    if value.is_nan() {
        return 0.5 * (low + high);
    }
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Event evaluation
// ---------------------------------------------------------------------------

/// A demand segment that has just ended.
#[derive(Debug, Clone, Copy)]
pub struct CompletedEvent {
    pub direction: TuneState,
    pub duration_ms: u32,
    pub scaler: f32,
    pub max_rate_pos: i16,
    pub max_rate_neg: i16,
}

/// Controller gains at the moment the event ended.
#[derive(Debug, Clone, Copy)]
pub struct LiveGains {
    pub ff: f32,
    pub p: f32,
    pub d: f32,
    pub slew_limit: f32,
}

/// New gains produced by a usable event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub ff_single: f32,
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The event was discarded; gains are unchanged.
    Rejected(Action),
    Adjusted(Adjustment),
}

/// Work out new FF/P/I/D from one completed event.
///
/// `ff_filter` is only advanced when the event passes the rate and length
/// guards and the single-event estimate is finite. A non-finite estimate
/// (zero scaler or rate) leaves FF where it was.
pub fn evaluate_event(
    event: &CompletedEvent,
    stats: &EventStats,
    live: &LiveGains,
    ff_filter: &mut LowPassFilter,
) -> Verdict {
    let positive = event.direction == TuneState::DemandPos;

    if (positive && stats.max_rate < 0.01 * event.max_rate_pos as f32)
        || (!positive && stats.min_rate > -0.01 * event.max_rate_neg as f32)
    {
        return Verdict::Rejected(Action::LowRate);
    }

    if event.duration_ms < MIN_EVENT_MS {
        return Verdict::Rejected(Action::Short);
    }

    let ff_single = if positive {
        stats.max_actuator / (stats.max_rate * event.scaler)
    } else {
        stats.min_actuator / (stats.min_rate * event.scaler)
    };

    let old_ff = live.ff;
    let smoothed = if ff_single.is_finite() { ff_filter.apply(ff_single) } else { old_ff };
    let ff = constrain(
        smoothed,
        old_ff * (1.0 - DECREASE_FF_STEP * 0.01),
        old_ff * (1.0 + INCREASE_FF_STEP * 0.01),
    );

    // did P or D exceed 30% of the total actuator?
    let pd_high = 0.3 * stats.peak_actuator_abs();
    let pd_significant = stats.max_p > pd_high || stats.max_d > pd_high;

    let dem_ratio = if positive {
        constrain(stats.max_rate / stats.max_target, 0.1, 2.0)
    } else {
        constrain(stats.min_rate / stats.min_target, 0.1, 2.0)
    };
    let overshot = dem_ratio > OVERSHOOT;

    let mut p = live.p.max(MIN_P);
    let mut d = live.d.max(MIN_D);

    let action = if stats.min_dmod < 1.0 || (overshot && pd_significant) {
        let gain_mul = decrease_pd_mul();
        let dmod_mul = linear_interpolate(gain_mul, 1.0, stats.min_dmod, 0.6, 1.0);
        let overshoot_mul = linear_interpolate(1.0, gain_mul, dem_ratio, OVERSHOOT, 1.3 * OVERSHOOT);
        // the term that peaked higher is assumed to be the one oscillating
        if stats.max_p < stats.max_d {
            d *= dmod_mul * overshoot_mul;
        } else {
            p *= dmod_mul * overshoot_mul;
        }
        Action::LowerPd
    } else {
        // full step below 20% of the slew limit, none above 60%
        let gain_mul = (100.0 + INCREASE_PD_STEP) * 0.01;
        let pd_mul = linear_interpolate(
            gain_mul,
            1.0,
            stats.max_slew_rate,
            0.2 * live.slew_limit,
            0.6 * live.slew_limit,
        );
        p *= pd_mul;
        d *= pd_mul;
        Action::RaisePd
    };

    let i = (p * I_RATIO).max(ff / TRIM_TCONST);

    Verdict::Adjusted(Adjustment { ff_single, ff, p, i, d, action })
}
