use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use fw_autotune::sim::{self, TraceRow};
use fw_autotune::telemetry::TuneRecord;
use fw_autotune::TuneConfig;

fn main() -> eframe::Result {
    let config = match std::env::args().nth(1) {
        Some(path) => match TuneConfig::from_toml_file(std::path::Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => TuneConfig::default(),
    };
    let outcome = sim::simulate(&config);

    let app = TuneViz {
        trace: outcome.trace,
        telemetry: outcome.telemetry,
        title: format!(
            "{} axis, level {}, {:.0} s",
            outcome.summary.axis.name(),
            outcome.summary.level,
            outcome.summary.duration_s
        ),
        ideal_ff: outcome.summary.ideal_ff as f64,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Fixed-Wing Autotune", options, Box::new(|_| Ok(Box::new(app))))
}

struct TuneViz {
    trace: Vec<TraceRow>,
    telemetry: Vec<TuneRecord>,
    title: String,
    ideal_ff: f64,
}

fn trace_series(rows: &[&TraceRow], f: impl Fn(&TraceRow) -> f64) -> PlotPoints<'static> {
    rows.iter().map(|r| [r.time, f(r)]).collect()
}

fn gain_series(records: &[TuneRecord], f: impl Fn(&TuneRecord) -> f32) -> PlotPoints<'static> {
    records
        .iter()
        .map(|r| [r.time_us as f64 * 1e-6, f(r) as f64])
        .collect()
}

impl eframe::App for TuneViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let step = (self.trace.len() / 4000).max(1);
        let sampled: Vec<&TraceRow> = self.trace.iter().step_by(step).collect();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(&self.title);
            if let Some(last) = self.telemetry.last() {
                ui.label(format!(
                    "FF {:.3} (ideal {:.3})  |  P {:.3}  |  I {:.3}  |  D {:.5}  |  tau {:.2} s  |  rmax {:.0} deg/s",
                    last.ff, self.ideal_ff, last.p, last.i, last.d, last.tau, last.rmax
                ));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Rate (deg/s)");
                    Plot::new("rate")
                        .width(half_w)
                        .height(half_h)
                        .legend(Legend::default())
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Demand", trace_series(&sampled, |r| r.desired_rate as f64)));
                            plot_ui.line(Line::new("Actual", trace_series(&sampled, |r| r.rate)));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Attitude (deg)");
                    Plot::new("attitude")
                        .width(half_w)
                        .height(half_h)
                        .legend(Legend::default())
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Command", trace_series(&sampled, |r| r.attitude_cmd)));
                            plot_ui.line(Line::new("Attitude", trace_series(&sampled, |r| r.attitude)));
                        });
                });
            });

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Surface (deg)");
                    Plot::new("surface")
                        .width(half_w)
                        .height(half_h)
                        .legend(Legend::default())
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Surface", trace_series(&sampled, |r| r.surface as f64)));
                            plot_ui.line(Line::new("FF", trace_series(&sampled, |r| r.ff as f64)));
                            plot_ui.line(Line::new("P", trace_series(&sampled, |r| r.p as f64)));
                            plot_ui.line(Line::new("I", trace_series(&sampled, |r| r.i as f64)));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Gains");
                    Plot::new("gains")
                        .width(half_w)
                        .height(half_h)
                        .legend(Legend::default())
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("FF", gain_series(&self.telemetry, |r| r.ff)));
                            plot_ui.line(Line::new("P", gain_series(&self.telemetry, |r| r.p)));
                            plot_ui.line(Line::new("I", gain_series(&self.telemetry, |r| r.i)));
                            plot_ui.line(Line::new("D x100", gain_series(&self.telemetry, |r| r.d * 100.0)));
                        });
                });
            });
        });
    }
}
