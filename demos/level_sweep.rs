use fw_autotune::sim;
use fw_autotune::tune::interfaces::MAX_AUTOTUNE_LEVEL;
use fw_autotune::TuneConfig;

/// Fly the same airframe at every autotune level and compare where the rate
/// shaping and gains end up.
fn main() {
    let mut config = TuneConfig::default();
    config.sim.duration_s = 90.0;

    println!(
        "{:>5}  {:>6}  {:>6}  {:>7}  {:>7}  {:>7}  {:>9}  {:>9}",
        "level", "tau", "rmax", "FF", "P", "I", "D", "decisions"
    );
    for level in 0..=MAX_AUTOTUNE_LEVEL {
        config.vehicle.autotune_level = level as i32;
        let outcome = sim::simulate(&config);
        let g = &outcome.summary.restore;
        println!(
            "{:>5}  {:>6.2}  {:>6}  {:>7.3}  {:>7.3}  {:>7.3}  {:>9.5}  {:>9}",
            level,
            g.time_constant,
            g.max_rate_pos,
            g.feed_forward,
            g.p,
            g.i,
            g.d,
            outcome.summary.decisions
        );
    }
    println!("Ideal FF for this airframe: {:.3}", config.airframe.ideal_ff());
}
