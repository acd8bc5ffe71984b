use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fw_autotune::io::{csv as trace_csv, json};
use fw_autotune::sim::{self, runner::action_table, SimOutcome, TraceRow};
use fw_autotune::tune::TuneState;
use fw_autotune::{init_tracing, Axis, TuneConfig};

#[derive(Debug, Parser)]
#[command(name = "fw-autotune")]
#[command(about = "Fly a simulated fixed-wing autotune session and report the tuned gains")]
struct Cli {
    /// TOML config; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_parser = parse_axis)]
    axis: Option<Axis>,

    /// Autotune level, 0 keeps the stored rate shaping.
    #[arg(long)]
    level: Option<i32>,

    /// Session length, s.
    #[arg(long)]
    duration: Option<f64>,

    /// Per-tick trace output.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// 25 Hz tuner telemetry output.
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// JSON session summary output.
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn parse_axis(s: &str) -> std::result::Result<Axis, String> {
    match s.to_ascii_lowercase().as_str() {
        "roll" => Ok(Axis::Roll),
        "pitch" => Ok(Axis::Pitch),
        other => Err(format!("unknown axis '{other}', expected roll or pitch")),
    }
}

fn load_config(cli: &Cli) -> Result<TuneConfig> {
    let mut cfg = match &cli.config {
        Some(path) => TuneConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => TuneConfig::default(),
    };
    if let Some(axis) = cli.axis {
        cfg.sim.axis = axis;
    }
    if let Some(level) = cli.level {
        cfg.vehicle.autotune_level = level;
    }
    if let Some(duration) = cli.duration {
        cfg.sim.duration_s = duration;
    }
    cfg.validate().context("invalid configuration after CLI overrides")?;
    Ok(cfg)
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    let outcome = sim::simulate(&cfg);

    if let Some(path) = &cli.csv {
        trace_csv::write_trace_file(path, &outcome.trace)
            .with_context(|| format!("failed to write trace: {}", path.display()))?;
    }
    if let Some(path) = &cli.telemetry {
        trace_csv::write_telemetry_file(path, &outcome.telemetry)
            .with_context(|| format!("failed to write telemetry: {}", path.display()))?;
    }
    if let Some(path) = &cli.summary {
        json::write_summary_file(path, &outcome.summary)
            .with_context(|| format!("failed to write summary: {}", path.display()))?;
    }

    print_report(&cfg, &outcome);
    Ok(())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

fn state_name(code: u8) -> &'static str {
    match code {
        c if c == TuneState::DemandPos.code() => "POS",
        c if c == TuneState::DemandNeg.code() => "NEG",
        _ => "IDLE",
    }
}

fn print_report(cfg: &TuneConfig, outcome: &SimOutcome) {
    let s = &outcome.summary;

    println!();
    println!("====================================================================");
    println!("  FIXED-WING AUTOTUNE: {} axis, level {}", s.axis.name(), s.level);
    println!("====================================================================");
    println!();
    println!("  Airframe");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Authority:     {:>8.2} (deg/s)/deg   Rate lag:   {:>6.2} s",
        cfg.airframe.authority, cfg.airframe.rate_tau
    );
    println!(
        "  Ideal FF:      {:>8.3}               Scaler:     {:>6.2}",
        s.ideal_ff, cfg.sim.scaler
    );
    println!();

    println!("  Gains");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:<12} {:>8} {:>8} {:>8} {:>9} {:>6} {:>5}",
        "", "FF", "P", "I", "D", "IMAX", "TAU"
    );
    println!(
        "  {:<12} {:>8.3} {:>8.3} {:>8.3} {:>9.5} {:>6.2} {:>5}",
        "initial", s.initial.ff, s.initial.p, s.initial.i, s.initial.d, s.initial.imax, "-"
    );
    for (label, g) in [("last saved", &s.last_save), ("restored", &s.restore)] {
        println!(
            "  {:<12} {:>8.3} {:>8.3} {:>8.3} {:>9.5} {:>6.2} {:>5.2}",
            label, g.feed_forward, g.p, g.i, g.d, g.integrator_limit, g.time_constant
        );
    }
    println!(
        "  Rate limits:   +{} / -{} deg/s",
        s.restore.max_rate_pos, s.restore.max_rate_neg
    );
    println!();

    println!("  Decisions");
    println!("  ──────────────────────────────────────────────────────────────────");
    for (name, count) in action_table(s) {
        println!("  {:<14} {:>5}", name, count);
    }
    println!(
        "  Durable writes: {} gains, {} rate shaping",
        s.durable_writes, s.shape_writes
    );
    println!();

    print_trace(&outcome.trace);

    println!();
    println!(
        "  Simulation: {:.1} s at {} Hz, {} telemetry records",
        s.duration_s,
        cfg.sim.loop_rate_hz,
        outcome.telemetry.len()
    );
    println!("====================================================================");
    println!();
}

fn print_trace(trace: &[TraceRow]) {
    println!("  Trace");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>7}  {:>7}  {:>8}  {:>8}  {:>7}  {:>5}",
        "t (s)", "cmd", "att", "rate", "demand", "surface", "state"
    );
    println!("  {}", "─".repeat(62));

    let sample_interval = (trace.len() / 30).max(1);
    for (i, r) in trace.iter().enumerate() {
        if i % sample_interval != 0 && i != trace.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>7.1}  {:>7.1}  {:>8.1}  {:>8.1}  {:>7.1}  {:>5}",
            r.time,
            r.attitude_cmd,
            r.attitude,
            r.rate,
            r.desired_rate,
            r.surface,
            state_name(r.state)
        );
    }
}
