use super::adjust::constrain;
use super::gains::GainSet;

// ---------------------------------------------------------------------------
// Aggressiveness table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuneLevel {
    pub tau: f32,
    pub rmax: i16,
}

/// Starting rate shaping per level, softest first. Level 0 keeps the
/// existing values instead.
pub const TUNING_TABLE: [TuneLevel; 11] = [
    TuneLevel { tau: 1.00, rmax: 20 },  // level 1
    TuneLevel { tau: 0.90, rmax: 30 },  // level 2
    TuneLevel { tau: 0.80, rmax: 40 },  // level 3
    TuneLevel { tau: 0.70, rmax: 50 },  // level 4
    TuneLevel { tau: 0.60, rmax: 60 },  // level 5
    TuneLevel { tau: 0.50, rmax: 75 },  // level 6
    TuneLevel { tau: 0.30, rmax: 90 },  // level 7
    TuneLevel { tau: 0.20, rmax: 120 }, // level 8
    TuneLevel { tau: 0.15, rmax: 160 }, // level 9
    TuneLevel { tau: 0.10, rmax: 210 }, // level 10
    TuneLevel { tau: 0.10, rmax: 300 }, // level 11
];

pub const RMAX_STEP: i16 = 20;
pub const TAU_STEP_FRACTION: f32 = 0.15;
pub const MIN_TAU: f32 = 0.1;
pub const MAX_TAU: f32 = 2.0;
pub const KEEP_RMAX_MIN: i16 = 75;
pub const KEEP_RMAX_MAX: i16 = 720;

/// Value a zero max rate is seeded with before ramping.
pub const INITIAL_RMAX: i16 = 75;
/// Value a non-positive or non-finite time constant is seeded with before
/// ramping.
pub const INITIAL_TAU: f32 = 1.0;

/// Where the ramp is heading for the given level.
pub fn target_for_level(gains: &GainSet, level: u8) -> TuneLevel {
    let level = level.min(TUNING_TABLE.len() as u8);
    let mut target = if level == 0 {
        TuneLevel {
            tau: gains.time_constant.clamp(MIN_TAU, MAX_TAU),
            rmax: gains.max_rate_pos.clamp(KEEP_RMAX_MIN, KEEP_RMAX_MAX),
        }
    } else {
        TUNING_TABLE[level as usize - 1]
    };

    if level > 0 && gains.feed_forward > 0.0 {
        let invtau = 1.0 / target.tau + gains.i / gains.feed_forward;
        if invtau > 0.0 {
            target.tau = target.tau.max(1.0 / invtau);
        }
    }
    target
}

/// Move max rate and time constant one step toward the level's target.
///
/// Rates move by at most 20 deg/s and the time constant by at most 15% of its
/// current value, so jumping straight to an aggressive level on a poorly
/// tuned airframe still changes things gradually.
pub fn update_rmax(gains: &mut GainSet, level: u8) {
    let level = level.min(TUNING_TABLE.len() as u8);
    let target = target_for_level(gains, level);

    if gains.max_rate_pos == 0 {
        gains.max_rate_pos = INITIAL_RMAX;
    }
    let current = gains.max_rate_pos;
    gains.max_rate_pos = target.rmax.clamp(
        current.saturating_sub(RMAX_STEP),
        current.saturating_add(RMAX_STEP),
    );

    if level != 0 || gains.max_rate_neg == 0 {
        gains.max_rate_neg = gains.max_rate_pos;
    }

    if !(gains.time_constant > 0.0 && gains.time_constant.is_finite()) {
        gains.time_constant = INITIAL_TAU;
    }
    let tau = gains.time_constant;
    let stepped = constrain(target.tau, tau * (1.0 - TAU_STEP_FRACTION), tau * (1.0 + TAU_STEP_FRACTION));
    gains.time_constant = constrain(stepped, MIN_TAU, MAX_TAU);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(tau: f32, rmax: i16) -> GainSet {
        GainSet {
            time_constant: tau,
            max_rate_pos: rmax,
            max_rate_neg: rmax,
            feed_forward: 0.0,
            ..GainSet::default()
        }
    }

    #[test]
    fn rmax_moves_by_at_most_twenty_without_overshoot() {
        for level in 0..=11u8 {
            for start in [20i16, 60, 75, 100, 200, 300, 700] {
                let mut g = gains(0.5, start);
                let target = target_for_level(&g, level).rmax;
                update_rmax(&mut g, level);
                let expected_step = (target - start).abs().min(RMAX_STEP);
                assert_eq!(
                    (g.max_rate_pos - start).abs(),
                    expected_step,
                    "level {level} start {start}"
                );
                assert!(
                    (g.max_rate_pos - target).abs() <= (start - target).abs(),
                    "level {level} start {start} moved away from {target}"
                );
            }
        }
    }

    #[test]
    fn tau_changes_at_most_fifteen_percent() {
        for level in 0..=11u8 {
            for start in [0.1f32, 0.3, 0.5, 1.0, 2.0] {
                let mut g = gains(start, 75);
                g.feed_forward = 0.5;
                g.i = 0.3;
                update_rmax(&mut g, level);
                assert!(
                    (g.time_constant - start).abs() <= start * TAU_STEP_FRACTION + 1e-6,
                    "level {level} start {start} -> {}",
                    g.time_constant
                );
                assert!(g.time_constant >= MIN_TAU && g.time_constant <= MAX_TAU);
            }
        }
    }

    #[test]
    fn repeated_steps_converge_on_table() {
        let mut g = gains(1.0, 20);
        for _ in 0..100 {
            update_rmax(&mut g, 10);
        }
        assert_eq!(g.max_rate_pos, 210);
        assert_eq!(g.max_rate_neg, 210);
        assert!((g.time_constant - 0.1).abs() < 1e-6);
    }

    #[test]
    fn level_zero_keeps_asymmetric_negative_rate() {
        let mut g = gains(0.5, 90);
        g.max_rate_neg = 60;
        update_rmax(&mut g, 0);
        assert_eq!(g.max_rate_pos, 90);
        assert_eq!(g.max_rate_neg, 60);

        update_rmax(&mut g, 6);
        assert_eq!(g.max_rate_neg, g.max_rate_pos);
    }

    #[test]
    fn zero_rmax_seeded_conservatively() {
        let mut g = gains(0.5, 0);
        g.max_rate_neg = 0;
        update_rmax(&mut g, 0);
        assert_eq!(g.max_rate_pos, 75);
        assert_eq!(g.max_rate_neg, 75);
    }

    #[test]
    fn non_finite_tau_is_reseeded() {
        for level in [0, 6] {
            let mut g = gains(f32::NAN, 100);
            update_rmax(&mut g, level);
            assert!(g.time_constant.is_finite(), "level {level}: {}", g.time_constant);
            assert!((MIN_TAU..=MAX_TAU).contains(&g.time_constant));
        }
    }

    #[test]
    fn out_of_range_level_is_clamped() {
        let mut a = gains(0.2, 250);
        let mut b = a;
        update_rmax(&mut a, 11);
        update_rmax(&mut b, 200);
        assert_eq!(a, b);
    }
}
