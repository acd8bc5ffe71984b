use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::airframe::{rk4_step, AxisState};
use super::clock::SimClock;
use super::params::RateShapeStore;
use super::pilot::{desired_rate, Pilot};
use super::rate_pid::RatePid;
use crate::config::TuneConfig;
use crate::io::json::SessionSummary;
use crate::telemetry::{Recorder, TuneRecord};
use crate::tune::{Action, AutoTune, GainSet};

// ---------------------------------------------------------------------------
// Trace output
// ---------------------------------------------------------------------------

/// One simulated control tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub time: f64,
    pub attitude_cmd: f64, // deg
    pub attitude: f64,     // deg
    pub rate: f64,         // deg/s
    pub desired_rate: f32, // deg/s
    pub surface: f32,      // deg
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub dmod: f32,
    pub state: u8,
}

#[derive(Debug, Clone)]
pub struct SimOutcome {
    pub trace: Vec<TraceRow>,
    pub telemetry: Vec<TuneRecord>,
    pub summary: SessionSummary,
}

type SimSession = AutoTune<RatePid, RateShapeStore, SimClock>;

fn initial_gain_set(config: &TuneConfig) -> GainSet {
    let g = &config.initial;
    GainSet {
        time_constant: g.shape.time_constant,
        max_rate_pos: g.shape.max_rate_pos,
        max_rate_neg: g.shape.max_rate_neg,
        feed_forward: g.ff,
        p: g.p,
        i: g.i,
        d: g.d,
        integrator_limit: g.imax,
    }
}

fn build_session(config: &TuneConfig, recorder: &Recorder) -> SimSession {
    let loop_hz = config.sim.loop_rate_hz;
    let gains = initial_gain_set(config);
    AutoTune::new(
        config.sim.axis,
        gains,
        config.vehicle,
        RatePid::new(config.initial.pid(), loop_hz as f32),
        RateShapeStore::from_gains(&gains),
        SimClock::new(loop_hz),
    )
    .with_telemetry(recorder.clone())
}

// ---------------------------------------------------------------------------
// Full session simulation
// ---------------------------------------------------------------------------

/// Fly one autotune session with a custom pilot. The session is started on
/// the first tick and stopped after the last, so the returned gains are the
/// ones a pilot leaving the mode would keep.
pub fn simulate_with(config: &TuneConfig, pilot: &mut dyn Pilot) -> SimOutcome {
    let recorder = Recorder::new();
    let mut session = build_session(config, &recorder);

    let axis = config.sim.axis;
    let scaler = config.sim.scaler;
    let dt = session.clock().dt();
    let limit = config.vehicle.attitude_limit_deg(axis) as f64;
    let steps = (config.sim.duration_s * config.sim.loop_rate_hz as f64).round() as usize;
    let trace_every = config.sim.trace_every.max(1);

    let mut state = AxisState::level();
    let mut trace = Vec::with_capacity(steps / trace_every + 1);
    let mut actions: BTreeMap<String, u32> = BTreeMap::new();
    let mut decisions = 0;

    info!(
        axis = axis.name(),
        pilot = pilot.name(),
        duration_s = config.sim.duration_s,
        loop_rate_hz = config.sim.loop_rate_hz,
        "simulating autotune session"
    );

    pilot.reset();
    session.start();

    for step in 0..steps {
        let attitude_cmd = pilot.attitude_command(state.time, dt).clamp(-limit, limit);
        let angle_err = (attitude_cmd - state.attitude()) as f32;

        let shape = *session.current();
        let target = desired_rate(angle_err, shape.time_constant, shape.max_rate_pos, shape.max_rate_neg);
        let (surface, pid_info) =
            session.controller_mut().update(target, state.rate() as f32, scaler, dt as f32);

        session.clock_mut().tick();
        session.update(&pid_info, scaler, angle_err);

        if session.decision_count() != decisions {
            decisions = session.decision_count();
            *actions.entry(session.action().name().to_string()).or_insert(0) += 1;
        }

        state = rk4_step(&config.airframe, &state, surface as f64, scaler as f64, dt);

        if step % trace_every == 0 {
            trace.push(TraceRow {
                time: state.time,
                attitude_cmd,
                attitude: state.attitude(),
                rate: state.rate(),
                desired_rate: target,
                surface,
                ff: pid_info.ff,
                p: pid_info.p,
                i: pid_info.i,
                d: pid_info.d,
                dmod: pid_info.dmod,
                state: session.state().code(),
            });
        }
    }

    session.stop();

    let params = session.controller().params();
    let summary = SessionSummary {
        axis,
        level: config.vehicle.level(),
        duration_s: state.time,
        ideal_ff: config.airframe.ideal_ff() as f32,
        initial: config.initial.pid(),
        final_live: params.live(),
        durable: params.durable(),
        restore: *session.restore_point(),
        last_save: *session.last_save(),
        decisions,
        actions,
        durable_writes: params.durable_writes(),
        shape_writes: session.store().writes(),
    };

    info!(
        decisions = summary.decisions,
        ff = summary.final_live.ff,
        p = summary.final_live.p,
        d = summary.final_live.d,
        "session finished"
    );

    SimOutcome { trace, telemetry: recorder.records(), summary }
}

/// Simulate with the configured doublet program.
pub fn simulate(config: &TuneConfig) -> SimOutcome {
    let limit = config.vehicle.attitude_limit_deg(config.sim.axis) as f64;
    let mut pilot = config.pilot.with_limit(limit);
    simulate_with(config, &mut pilot)
}

/// Name of each action with its count, zero counts included.
pub fn action_table(summary: &SessionSummary) -> Vec<(&'static str, u32)> {
    Action::ALL
        .iter()
        .map(|a| (a.name(), summary.actions.get(a.name()).copied().unwrap_or(0)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tune::Axis;

    fn config(duration_s: f64) -> TuneConfig {
        let mut cfg = TuneConfig::default();
        cfg.sim.duration_s = duration_s;
        cfg
    }

    #[test]
    fn session_raises_ff_toward_airframe() {
        let out = simulate(&config(60.0));
        let s = &out.summary;
        assert!(s.decisions >= 5, "only {} decisions", s.decisions);
        let peak_ff = out.telemetry.iter().map(|r| r.ff).fold(0.0_f32, f32::max);
        assert!(peak_ff > 2.0 * s.initial.ff, "FF never moved: {peak_ff}");
        assert!(peak_ff < 3.0 * s.ideal_ff, "FF ran away: {peak_ff}");
    }

    #[test]
    fn leaving_the_mode_keeps_the_checkpoint() {
        let out = simulate(&config(35.0));
        let s = &out.summary;
        assert_eq!(s.final_live.ff, s.restore.feed_forward);
        assert_eq!(s.final_live.p, s.restore.p);
        assert_eq!(s.final_live.i, s.restore.i);
        assert_eq!(s.final_live.d, s.restore.d);
        assert_eq!(s.final_live.imax, s.restore.integrator_limit);
    }

    #[test]
    fn telemetry_runs_at_25_hz() {
        let out = simulate(&config(20.0));
        let n = out.telemetry.len() as i64;
        assert!((n - 500).abs() <= 1, "{n} records");
    }

    #[test]
    fn trace_is_decimated() {
        let mut cfg = config(10.0);
        cfg.sim.trace_every = 10;
        let out = simulate(&cfg);
        assert_eq!(out.trace.len(), 50);
        assert!((out.summary.duration_s - 10.0).abs() < 1e-6);
    }

    #[test]
    fn pitch_demands_stay_inside_limits() {
        let mut cfg = config(15.0);
        cfg.sim.axis = Axis::Pitch;
        let out = simulate(&cfg);
        let peak = out.trace.iter().map(|r| r.attitude_cmd.abs()).fold(0.0, f64::max);
        assert!(peak <= 20.0 + 1e-9);
        assert!(out.telemetry.iter().all(|r| r.axis == 1));
    }

    #[test]
    fn level_zero_keeps_rate_shaping() {
        let mut cfg = config(30.0);
        cfg.vehicle.autotune_level = 0;
        let out = simulate(&cfg);
        assert_eq!(out.summary.shape_writes, 0);
        assert_eq!(out.summary.restore.time_constant, 0.5);
        assert_eq!(out.summary.restore.max_rate_pos, 75);
    }

    #[test]
    fn action_table_lists_every_action() {
        let out = simulate(&config(20.0));
        let table = action_table(&out.summary);
        assert_eq!(table.len(), Action::ALL.len());
        let total: u32 = table.iter().map(|(_, n)| n).sum();
        assert_eq!(total, out.summary.decisions);
    }
}
