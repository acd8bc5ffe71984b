use fw_autotune::sim::{self, Pilot};
use fw_autotune::TuneConfig;

/// Rolls hard left and right with no pause, then the session is abandoned
/// after 15 s. Whatever the tuner did in the last save period is discarded.
struct SnapRolls {
    angle: f64,
    half_period: f64,
}

impl Pilot for SnapRolls {
    fn attitude_command(&mut self, time: f64, _dt: f64) -> f64 {
        if (time / self.half_period) as u64 % 2 == 0 {
            self.angle
        } else {
            -self.angle
        }
    }

    fn name(&self) -> &str {
        "SnapRolls"
    }
}

fn main() {
    let mut config = TuneConfig::default();
    config.sim.duration_s = 15.0;

    let mut pilot = SnapRolls { angle: 40.0, half_period: 1.5 };

    println!("Simulating with {} pilot...", pilot.name());
    let outcome = sim::simulate_with(&config, &mut pilot);
    let s = &outcome.summary;

    let flown = outcome.telemetry.last();
    println!("Decisions taken: {}", s.decisions);
    if let Some(r) = flown {
        println!("Gains in flight at exit:  FF {:.3}  P {:.3}  I {:.3}  D {:.5}", r.ff, r.p, r.i, r.d);
    }
    println!(
        "Gains kept after exit:    FF {:.3}  P {:.3}  I {:.3}  D {:.5}",
        s.final_live.ff, s.final_live.p, s.final_live.i, s.final_live.d
    );
    println!(
        "Stored on disk:           FF {:.3}  P {:.3}  I {:.3}  D {:.5}",
        s.durable.ff, s.durable.p, s.durable.i, s.durable.d
    );
}
