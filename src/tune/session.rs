//! One autotune session on one axis.
//!
//! While the pilot flies in autotune, gains are committed every 10 s, but
//! what gets committed is the set from the *previous* period. Leaving the mode
//! restores that same set, so the pilot always has up to 10 s to back out of
//! a change they do not like. No special switches are needed; entering and
//! leaving the mode is enough.

use tracing::{debug, info, warn};

use super::adjust::{self, Action, CompletedEvent, LiveGains, Verdict};
use super::event::{EventStats, EventThresholds, TuneState};
use super::filter::FilterBank;
use super::gains::{Axis, GainSet};
use super::interfaces::{AxisParamStore, Clock, FixedWingParams, Gain, PidInfo, RateController};
use super::ramp;
use crate::telemetry::{TelemetrySink, TuneRecord};

/// Time between commits, ms.
pub const SAVE_PERIOD_MS: u32 = 10_000;
/// Minimum time between telemetry records (25 Hz), ms.
pub const LOG_PERIOD_MS: u32 = 40;
/// Idle dwell after which a persistently active slew limiter counts as
/// oscillation, ms.
pub const IDLE_OSCILLATION_MS: u32 = 500;
pub const IDLE_OSCILLATION_DMOD: f32 = 0.9;

pub const MIN_IMAX: f32 = 0.4;
pub const MAX_IMAX: f32 = 0.9;
pub const MIN_FF: f32 = 0.01;
/// Slew limit installed when the controller has none, deg/s.
pub const DEFAULT_SLEW_LIMIT: f32 = 150.0;

/// Relative change below which a float parameter is not rewritten.
const SAVE_TOLERANCE: f32 = 0.001;

pub struct AutoTune<R, S, C> {
    axis: Axis,
    params: FixedWingParams,
    rate: R,
    store: S,
    clock: C,
    telemetry: Option<Box<dyn TelemetrySink>>,

    running: bool,
    state: TuneState,
    action: Action,
    decisions: u32,
    ff_single: f32,

    current: GainSet,
    restore: GainSet,
    last_save: GainSet,
    next_save: GainSet,

    filters: FilterBank,
    stats: EventStats,

    start_ms: u32,
    last_save_ms: u32,
    last_log_ms: u32,
    state_enter_ms: u32,
}

impl<R, S, C> AutoTune<R, S, C>
where
    R: RateController,
    S: AxisParamStore,
    C: Clock,
{
    /// `gains` supplies the stored time constant and max rates; the PID terms
    /// are always read back from `rate`.
    pub fn new(axis: Axis, gains: GainSet, params: FixedWingParams, rate: R, store: S, clock: C) -> Self {
        let filters = FilterBank::new(clock.loop_rate_hz() as f32);
        Self {
            axis,
            params,
            rate,
            store,
            clock,
            telemetry: None,
            running: false,
            state: TuneState::Idle,
            action: Action::None,
            decisions: 0,
            ff_single: 0.0,
            current: gains,
            restore: gains,
            last_save: gains,
            next_save: gains,
            filters,
            stats: EventStats::default(),
            start_ms: 0,
            last_save_ms: 0,
            last_log_ms: 0,
            state_enter_ms: 0,
        }
    }

    pub fn with_telemetry(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Some(Box::new(sink));
        self
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    pub fn start(&mut self) {
        self.running = true;
        let now = self.clock.millis();
        self.start_ms = now;
        self.last_save_ms = now;
        self.last_log_ms = now;
        self.action = Action::None;
        self.ff_single = 0.0;
        self.stats = EventStats::default();
        self.enter_state(TuneState::Idle, now);

        self.filters.configure(self.clock.loop_rate_hz() as f32);
        self.filters.reset();

        let seeded = self.read_merged(&self.current);
        self.current = seeded;
        self.restore = seeded;
        self.last_save = seeded;

        // first step of rmax and tau happens straight away
        ramp::update_rmax(&mut self.current, self.params.level());

        let imax = self.rate.gain(Gain::IMax).clamp(MIN_IMAX, MAX_IMAX);
        self.rate.set_gain(Gain::IMax, imax);
        self.current.integrator_limit = imax;

        if !(self.rate.gain(Gain::SlewLimit) > 0.0) {
            self.rate.save_gain(Gain::SlewLimit, DEFAULT_SLEW_LIMIT);
        }

        if self.current.feed_forward < MIN_FF {
            self.current.feed_forward = MIN_FF;
            self.rate.set_gain(Gain::FeedForward, MIN_FF);
        }

        self.next_save = self.current;

        info!(
            axis = self.axis.name(),
            autotune_level = self.params.level(),
            tau = self.current.time_constant,
            rmax = self.current.max_rate_pos,
            "autotune started"
        );
        debug!(ff = self.rate.gain(Gain::FeedForward), "start FF");
    }

    /// Leave autotune, putting back the last accepted checkpoint.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        let restore = self.restore;
        self.commit(&restore);
        self.apply(&restore);
        info!(
            axis = self.axis.name(),
            duration_ms = self.clock.millis().wrapping_sub(self.start_ms),
            ff = restore.feed_forward,
            p = restore.p,
            i = restore.i,
            d = restore.d,
            "autotune stopped, gains restored"
        );
    }

    // -----------------------------------------------------------------------
    // Per-tick update
    // -----------------------------------------------------------------------

    /// One control tick. `scaler` converts surface deflection to rate
    /// authority at the current airspeed.
    pub fn update(&mut self, info: &PidInfo, scaler: f32, angle_err_deg: f32) {
        if !self.running {
            return;
        }
        self.check_save();

        let desired_rate = self.filters.target.apply(info.target);
        // the integrator is left out so ratios are not skewed by trim
        let actuator = self.filters.actuator.apply(info.clipped_actuator());
        let actual_rate = self.filters.rate.apply(info.actual);

        self.stats.observe(actuator, actual_rate, desired_rate, info);

        let thresholds = EventThresholds::new(
            self.params.attitude_limit_deg(self.axis),
            self.current.time_constant,
            self.current.max_rate_pos,
        );
        let new_state = thresholds.next_state(self.state, desired_rate, angle_err_deg);

        let now = self.clock.millis();
        self.log_if_due(now, new_state, actuator, desired_rate, actual_rate);

        if new_state == self.state {
            if self.state == TuneState::Idle
                && now.wrapping_sub(self.state_enter_ms) > IDLE_OSCILLATION_MS
                && self.stats.max_dmod < IDLE_OSCILLATION_DMOD
            {
                self.lower_pd_while_idle(now);
            }
            return;
        }

        if new_state != TuneState::Idle {
            // starting an event
            self.stats.begin_event();
            self.state_enter_ms = now;
            self.state = new_state;
            return;
        }

        self.finish_event(now, scaler);
        self.enter_state(TuneState::Idle, now);
    }

    fn finish_event(&mut self, now: u32, scaler: f32) {
        let event = CompletedEvent {
            direction: self.state,
            duration_ms: now.wrapping_sub(self.state_enter_ms),
            scaler,
            max_rate_pos: self.current.max_rate_pos,
            max_rate_neg: self.current.max_rate_neg,
        };
        let live = LiveGains {
            ff: self.rate.gain(Gain::FeedForward),
            p: self.rate.gain(Gain::P),
            d: self.rate.gain(Gain::D),
            slew_limit: self.rate.gain(Gain::SlewLimit),
        };

        self.decisions = self.decisions.wrapping_add(1);
        match adjust::evaluate_event(&event, &self.stats, &live, &mut self.filters.ff) {
            Verdict::Rejected(action) => {
                self.action = action;
                debug!(action = action.name(), duration_ms = event.duration_ms, "event discarded");
            }
            Verdict::Adjusted(adj) => {
                self.ff_single = adj.ff_single;
                self.rate.set_gain(Gain::FeedForward, adj.ff);
                self.rate.set_gain(Gain::P, adj.p);
                self.rate.set_gain(Gain::D, adj.d);
                self.rate.set_gain(Gain::I, adj.i);

                self.current.feed_forward = adj.ff;
                self.current.p = adj.p;
                self.current.i = self.rate.gain(Gain::I);
                self.current.d = adj.d;
                self.action = adj.action;

                debug!(
                    action = adj.action.name(),
                    ff_single = adj.ff_single,
                    ff = adj.ff,
                    p = adj.p,
                    i = adj.i,
                    d = adj.d,
                    "FPID"
                );

                // move rmax and tau towards target
                ramp::update_rmax(&mut self.current, self.params.level());
            }
        }
    }

    /// Sitting idle with the slew limiter engaged the whole time means the
    /// loop is oscillating on its own.
    fn lower_pd_while_idle(&mut self, now: u32) {
        let gain_mul = adjust::decrease_pd_mul();
        if self.stats.max_p < self.stats.max_d {
            self.current.d *= gain_mul;
        } else {
            self.current.p *= gain_mul;
        }
        self.rate.set_gain(Gain::P, self.current.p);
        self.rate.set_gain(Gain::D, self.current.d);
        self.action = Action::IdleLowerPd;
        self.decisions = self.decisions.wrapping_add(1);
        debug!(p = self.current.p, d = self.current.d, "oscillating while idle");
        self.enter_state(self.state, now);
    }

    fn enter_state(&mut self, state: TuneState, now: u32) {
        self.stats.reset_terms();
        self.state = state;
        self.state_enter_ms = now;
    }

    fn log_if_due(&mut self, now: u32, state: TuneState, actuator: f32, desired_rate: f32, actual_rate: f32) {
        if now.wrapping_sub(self.last_log_ms) < LOG_PERIOD_MS {
            return;
        }
        self.last_log_ms = now;
        let Some(sink) = self.telemetry.as_mut() else {
            return;
        };
        let record = TuneRecord {
            time_us: self.clock.micros64(),
            axis: self.axis.code(),
            state: state.code(),
            actuator,
            desired_rate,
            actual_rate,
            ff_single: self.ff_single,
            ff: self.current.feed_forward,
            p: self.current.p,
            i: self.current.i,
            d: self.current.d,
            action: self.action.code(),
            rmax: self.current.max_rate_pos as f32,
            tau: self.current.time_constant,
        };
        if let Err(e) = sink.write_record(&record) {
            warn!(error = %e, "dropping autotune telemetry record");
        }
    }

    // -----------------------------------------------------------------------
    // Delayed persistence
    // -----------------------------------------------------------------------

    /// Commit the gains from one period ago once a period has elapsed.
    fn check_save(&mut self) {
        let now = self.clock.millis();
        if now.wrapping_sub(self.last_save_ms) < SAVE_PERIOD_MS {
            return;
        }

        let candidate = self.read_merged(&self.current);

        let next = self.next_save;
        let writes = self.commit(&next);

        // committing pushed `next` into the controller; put back what we fly
        self.apply(&candidate);

        // leaving autotune now lands on the values just committed
        self.restore = next;
        self.next_save = candidate;
        self.last_save_ms = now;

        info!(
            axis = self.axis.name(),
            writes,
            ff = next.feed_forward,
            p = next.p,
            i = next.i,
            d = next.d,
            "committed autotune gains"
        );
    }

    /// Push `v` to the controller and durably store every field that moved
    /// since the last commit. Returns the number of durable writes.
    fn commit(&mut self, v: &GainSet) -> usize {
        let old = self.last_save;
        let mut writes = 0;

        if float_changed(old.time_constant, v.time_constant) {
            self.store.save_time_constant(v.time_constant);
            writes += 1;
        }
        if old.max_rate_pos != v.max_rate_pos {
            self.store.save_max_rate_pos(v.max_rate_pos);
            writes += 1;
        }
        if old.max_rate_neg != v.max_rate_neg {
            self.store.save_max_rate_neg(v.max_rate_neg);
            writes += 1;
        }

        let terms = [
            (Gain::FeedForward, old.feed_forward, v.feed_forward),
            (Gain::P, old.p, v.p),
            (Gain::I, old.i, v.i),
            (Gain::D, old.d, v.d),
            (Gain::IMax, old.integrator_limit, v.integrator_limit),
        ];
        for (gain, old_value, value) in terms {
            if float_changed(old_value, value) {
                self.rate.save_gain(gain, value);
                writes += 1;
            } else {
                self.rate.set_gain(gain, value);
            }
        }

        self.last_save = self.read_merged(v);
        writes
    }

    /// `base` with its PID terms replaced by the controller's live values.
    fn read_merged(&self, base: &GainSet) -> GainSet {
        GainSet {
            feed_forward: self.rate.gain(Gain::FeedForward),
            p: self.rate.gain(Gain::P),
            i: self.rate.gain(Gain::I),
            d: self.rate.gain(Gain::D),
            integrator_limit: self.rate.gain(Gain::IMax),
            ..*base
        }
    }

    fn apply(&mut self, v: &GainSet) {
        self.current = *v;
        self.rate.set_gain(Gain::FeedForward, v.feed_forward);
        self.rate.set_gain(Gain::P, v.p);
        self.rate.set_gain(Gain::I, v.i);
        self.rate.set_gain(Gain::D, v.d);
        self.rate.set_gain(Gain::IMax, v.integrator_limit);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> TuneState {
        self.state
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Bumped every time `action` is set, including repeats of the same
    /// action.
    pub fn decision_count(&self) -> u32 {
        self.decisions
    }

    pub fn stats(&self) -> &EventStats {
        &self.stats
    }

    pub fn current(&self) -> &GainSet {
        &self.current
    }

    pub fn restore_point(&self) -> &GainSet {
        &self.restore
    }

    pub fn last_save(&self) -> &GainSet {
        &self.last_save
    }

    pub fn next_save(&self) -> &GainSet {
        &self.next_save
    }

    pub fn params(&self) -> &FixedWingParams {
        &self.params
    }

    pub fn set_params(&mut self, params: FixedWingParams) {
        self.params = params;
    }

    pub fn controller(&self) -> &R {
        &self.rate
    }

    pub fn controller_mut(&mut self) -> &mut R {
        &mut self.rate
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

/// A non-positive value is always written.
fn float_changed(old_value: f32, value: f32) -> bool {
    value <= 0.0 || ((value - old_value) / value).abs() > SAVE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::clock::SimClock;
    use crate::sim::params::{ParamTable, PidGains, RateShapeStore};

    type Session = AutoTune<ParamTable, RateShapeStore, SimClock>;

    const LOOP_HZ: u16 = 100;

    fn pid_gains() -> PidGains {
        PidGains { ff: 0.4, p: 0.1, i: 0.3, d: 0.005, imax: 0.5, slew_limit: 150.0 }
    }

    fn shape() -> GainSet {
        GainSet { time_constant: 0.5, max_rate_pos: 75, max_rate_neg: 75, ..GainSet::default() }
    }

    fn level0() -> FixedWingParams {
        FixedWingParams { autotune_level: 0, ..FixedWingParams::default() }
    }

    fn session_with(gains: PidGains) -> Session {
        AutoTune::new(
            Axis::Roll,
            shape(),
            level0(),
            ParamTable::new(gains),
            RateShapeStore::from_gains(&shape()),
            SimClock::new(LOOP_HZ),
        )
    }

    fn started() -> Session {
        let mut s = session_with(pid_gains());
        s.start();
        s
    }

    /// Controller output of a constant 20 deg surface producing 40 deg/s.
    fn info(target: f32) -> PidInfo {
        PidInfo { target, actual: 40.0, ff: 20.0, dmod: 1.0, ..PidInfo::default() }
    }

    fn tick(s: &mut Session, info: &PidInfo) {
        tick_scaled(s, info, 1.0);
    }

    fn tick_scaled(s: &mut Session, info: &PidInfo, scaler: f32) {
        s.clock_mut().tick();
        s.update(info, scaler, 20.0);
    }

    fn idle(s: &mut Session, ticks: usize) {
        for _ in 0..ticks {
            tick(s, &info(0.0));
        }
    }

    /// Hold a positive demand for `hold` ticks, then reverse until the
    /// detector is back to idle.
    fn run_event(s: &mut Session, hold: usize) {
        run_event_scaled(s, hold, 1.0);
    }

    fn run_event_scaled(s: &mut Session, hold: usize, scaler: f32) {
        for _ in 0..hold {
            tick_scaled(s, &info(1000.0), scaler);
        }
        for _ in 0..50 {
            tick_scaled(s, &info(-1000.0), scaler);
            if s.state() == TuneState::Idle {
                return;
            }
        }
        panic!("event never ended");
    }

    fn live(s: &Session) -> PidGains {
        s.controller().live()
    }

    #[test]
    fn start_clamps_integrator_limit() {
        for (stored, expected) in [(2.0, 0.9), (0.1, 0.4), (0.6, 0.6)] {
            let mut s = session_with(PidGains { imax: stored, ..pid_gains() });
            s.start();
            assert_eq!(live(&s).imax, expected);
            assert_eq!(s.current().integrator_limit, expected);
        }
    }

    #[test]
    fn start_floors_ff_and_installs_slew_limit() {
        let mut s = session_with(PidGains { ff: 0.0, slew_limit: 0.0, ..pid_gains() });
        s.start();
        assert_eq!(live(&s).ff, MIN_FF);
        assert_eq!(live(&s).slew_limit, DEFAULT_SLEW_LIMIT);
        assert_eq!(s.controller().durable().slew_limit, DEFAULT_SLEW_LIMIT);
        // the FF floor is not persisted
        assert_eq!(s.controller().durable().ff, 0.0);
    }

    #[test]
    fn update_is_inert_until_started() {
        let mut s = session_with(pid_gains());
        idle(&mut s, 10);
        run_event(&mut s, 30);
        assert_eq!(live(&s), pid_gains());
        assert_eq!(s.action(), Action::None);
    }

    #[test]
    fn entering_demand_zeroes_accumulators() {
        let mut s = started();
        idle(&mut s, 20);
        assert!(s.stats().max_actuator > 0.0);
        tick(&mut s, &info(1000.0));
        assert_eq!(s.state(), TuneState::DemandPos);
        let st = s.stats();
        assert_eq!(st.min_actuator, 0.0);
        assert_eq!(st.max_actuator, 0.0);
        assert_eq!(st.min_rate, 0.0);
        assert_eq!(st.max_rate, 0.0);
    }

    #[test]
    fn completed_event_raises_gains_with_bounded_ff() {
        // Scenario: peak actuator 20, peak rate 40, scaler 1
        let mut s = started();
        idle(&mut s, 20);
        let old_ff = live(&s).ff;
        run_event(&mut s, 30);

        assert_eq!(s.action(), Action::RaisePd);
        let g = live(&s);
        assert!(g.ff >= 0.85 * old_ff && g.ff <= 1.12 * old_ff + 1e-6);
        assert!((g.ff - 0.448).abs() < 1e-5, "ff {}", g.ff);
        assert!((g.p - 0.11).abs() < 1e-6);
        assert!((g.d - 0.0055).abs() < 1e-7);
        assert!((g.i - 0.448).abs() < 1e-5);
        assert_eq!(s.current().feed_forward, g.ff);
        assert_eq!(s.current().i, g.i);
    }

    #[test]
    fn negative_event_raises_gains_like_positive() {
        // peak actuator -20, peak rate -40, scaler 1
        let mut s = started();
        let neg = |target| PidInfo { target, actual: -40.0, ff: -20.0, dmod: 1.0, ..PidInfo::default() };
        for _ in 0..20 {
            tick(&mut s, &neg(0.0));
        }
        tick(&mut s, &neg(-1000.0));
        assert_eq!(s.state(), TuneState::DemandNeg);
        for _ in 0..29 {
            tick(&mut s, &neg(-1000.0));
        }
        while s.state() != TuneState::Idle {
            tick(&mut s, &neg(1000.0));
        }

        assert_eq!(s.action(), Action::RaisePd);
        let g = live(&s);
        assert!((g.ff - 0.448).abs() < 1e-5, "ff {}", g.ff);
        assert!((g.p - 0.11).abs() < 1e-6);
        assert!((g.d - 0.0055).abs() < 1e-7);
        assert!((g.i - 0.448).abs() < 1e-5);
    }

    #[test]
    fn zero_scaler_event_keeps_ff_bounded() {
        let mut s = started();
        idle(&mut s, 20);
        run_event_scaled(&mut s, 30, 0.0);
        assert_eq!(live(&s).ff, 0.4);

        let mut prev = live(&s).ff;
        for _ in 0..3 {
            run_event(&mut s, 30);
            let ff = live(&s).ff;
            assert!(ff.is_finite(), "ff went non-finite");
            assert!(ff >= 0.85 * prev - 1e-6 && ff <= 1.12 * prev + 1e-6, "ff {prev} -> {ff}");
            prev = ff;
        }
        assert!((prev - 0.5).abs() < 1e-5, "ff {prev}");
    }

    #[test]
    fn short_event_leaves_gains_alone() {
        let mut s = started();
        idle(&mut s, 20);
        let before = live(&s);
        run_event(&mut s, 3);
        assert_eq!(s.action(), Action::Short);
        assert_eq!(s.decision_count(), 1);
        assert_eq!(live(&s), before);
    }

    #[test]
    fn event_without_rate_is_discarded() {
        let mut s = started();
        let still = |target| PidInfo { target, actual: 0.0, ff: 20.0, dmod: 1.0, ..PidInfo::default() };
        for _ in 0..20 {
            tick(&mut s, &still(0.0));
        }
        let before = live(&s);
        for _ in 0..30 {
            tick(&mut s, &still(1000.0));
        }
        while s.state() != TuneState::Idle {
            tick(&mut s, &still(-1000.0));
        }
        assert_eq!(s.action(), Action::LowRate);
        assert_eq!(live(&s), before);
    }

    #[test]
    fn idle_with_slew_limiter_active_lowers_dominant_term() {
        let mut s = started();
        let limited = PidInfo { p: 6.0, d: 2.0, dmod: 0.5, ..PidInfo::default() };
        // 500 ms of dwell is not enough, it has to be exceeded
        for _ in 0..50 {
            tick(&mut s, &limited);
        }
        assert_eq!(s.action(), Action::None);
        tick(&mut s, &limited);
        assert_eq!(s.action(), Action::IdleLowerPd);
        assert!((live(&s).p - 0.08).abs() < 1e-7);
        assert_eq!(live(&s).d, 0.005);
        assert_eq!(s.state(), TuneState::Idle);
        assert_eq!(s.stats().max_p, 0.0);
    }

    #[test]
    fn idle_without_limiting_changes_nothing() {
        let mut s = started();
        idle(&mut s, 200);
        assert_eq!(s.action(), Action::None);
        assert_eq!(live(&s).p, 0.1);
    }

    #[test]
    fn commits_lag_one_period() {
        let mut s = started();
        let still = info(0.0);
        for k in 1..=3000 {
            match k {
                500 => s.controller_mut().set_gain(Gain::P, 0.2),
                1500 => s.controller_mut().set_gain(Gain::P, 0.3),
                2500 => s.controller_mut().set_gain(Gain::P, 0.4),
                _ => {}
            }
            tick(&mut s, &still);
            match k {
                1000 => {
                    // first commit stores what we had at start
                    assert_eq!(s.last_save().p, 0.1);
                    assert_eq!(s.next_save().p, 0.2);
                }
                2000 => {
                    assert_eq!(s.last_save().p, 0.2);
                    assert_eq!(s.restore_point().p, 0.2);
                    assert_eq!(s.controller().durable().p, 0.2);
                    assert_eq!(live(&s).p, 0.3);
                }
                _ => {}
            }
        }
        assert_eq!(s.last_save().p, 0.3);
        assert_eq!(s.controller().durable().p, 0.3);
        assert_eq!(s.next_save().p, 0.4);
        assert_eq!(live(&s).p, 0.4);
    }

    #[test]
    fn unchanged_gains_are_not_rewritten() {
        let mut s = started();
        let writes = s.controller().durable_writes();
        idle(&mut s, 2100);
        assert_eq!(s.controller().durable_writes(), writes);
        assert_eq!(s.store().writes(), 0);
    }

    #[test]
    fn stop_before_commit_restores_start_snapshot() {
        let start_gains = PidGains { imax: 1.5, ..pid_gains() };
        let mut s = session_with(start_gains);
        s.start();
        idle(&mut s, 20);
        run_event(&mut s, 30);
        run_event(&mut s, 30);
        assert_ne!(live(&s), start_gains);

        s.stop();
        assert!(!s.is_running());
        assert_eq!(live(&s), start_gains);
        assert_eq!(s.current().time_constant, 0.5);
    }

    #[test]
    fn stop_after_commit_restores_checkpoint_not_later_changes() {
        let mut s = started();
        idle(&mut s, 20);
        run_event(&mut s, 30);
        // carry on until two commits have happened
        idle(&mut s, 2000);
        let checkpoint = *s.restore_point();
        run_event(&mut s, 30);
        assert_ne!(live(&s).p, checkpoint.p);

        s.stop();
        let g = live(&s);
        assert_eq!(g.ff, checkpoint.feed_forward);
        assert_eq!(g.p, checkpoint.p);
        assert_eq!(g.i, checkpoint.i);
        assert_eq!(g.d, checkpoint.d);
        assert_eq!(g.imax, checkpoint.integrator_limit);
    }

    #[test]
    fn telemetry_limited_to_25_hz() {
        use crate::telemetry::Recorder;
        let rec = Recorder::new();
        let mut s = session_with(pid_gains()).with_telemetry(rec.clone());
        s.start();
        idle(&mut s, 100);
        assert_eq!(rec.len(), 25);
        let r = rec.records();
        assert!(r.windows(2).all(|w| w[1].time_us - w[0].time_us >= 40_000));
        assert_eq!(r[0].axis, 0);
        assert_eq!(r[0].rmax, 75.0);
    }
}
