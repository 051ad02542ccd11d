use std::env;
use std::thread;

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use common::config::load_config;
use common::{DashboardBuffer, ExperimentConfig, TelemetryRecorder};

struct DashboardApp {
    buffer: DashboardBuffer,
    config: ExperimentConfig,
    config_path: String,
    mode: String,
    experiment: Option<thread::JoinHandle<TelemetryRecorder>>,
    summary: Option<String>,
}

impl DashboardApp {
    fn new(config: ExperimentConfig, config_path: String, mode: String) -> Self {
        Self {
            buffer: DashboardBuffer::new(2000),
            config,
            config_path,
            mode,
            experiment: None,
            summary: None,
        }
    }

    fn start_experiment(&mut self) {
        if self.experiment.is_some() {
            return;
        }
        self.buffer.clear();
        self.summary = None;

        let config = self.config.clone();
        let buffer = self.buffer.clone();
        let mode = self.mode.clone();
        self.experiment = Some(thread::spawn(move || {
            if mode == "async" {
                tokio::runtime::Runtime::new()
                    .unwrap()
                    .block_on(async_impl::run_experiment_with_dashboard(config, Some(buffer)))
            } else {
                threaded_impl::run_experiment_with_dashboard(config, Some(buffer))
            }
        }));
    }

    fn poll_experiment(&mut self) {
        let finished = self
            .experiment
            .as_ref()
            .map_or(false, |handle| handle.is_finished());
        if !finished {
            return;
        }
        if let Some(handle) = self.experiment.take() {
            if let Ok(recorder) = handle.join() {
                let results = recorder.get_results();
                let final_response = results.last().map_or(1.0, |r| r.response_limit);
                self.summary = Some(format!(
                    "{} ticks, {} damped, final response limit {:.2}",
                    results.len(),
                    recorder.damped_ticks(),
                    final_response
                ));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_experiment();
        let frames = self.buffer.get_recent(2000);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let running = self.experiment.is_some();
                if ui
                    .add_enabled(!running, egui::Button::new("Start experiment"))
                    .clicked()
                {
                    self.start_experiment();
                }
                if running {
                    ui.spinner();
                }
                ui.label(format!("config: {}", self.config_path));
                ui.label(format!("mode: {}", self.mode));
            });
        });

        egui::SidePanel::left("stats").show(ctx, |ui| {
            ui.heading("Damper");
            if let Some(snapshot) = frames.iter().rev().find_map(|f| f.snapshot) {
                ui.label(format!("tick: {}", snapshot.tick_id));
                ui.label(format!("error angle: {:.2} deg", snapshot.error_angle_deg));
                ui.label(format!("clamp factor: {:.2}", snapshot.clamp_factor));
                ui.label(format!("response limit: {:.2}", snapshot.response_limit));
                ui.label(if snapshot.damped {
                    "state: damped"
                } else {
                    "state: nominal"
                });
            } else {
                ui.label("no data yet");
            }

            ui.separator();
            if self.config.damper.plus_enabled {
                ui.heading("Tunables");
                ui.label(format!(
                    "min response limit: {:.2}",
                    self.config.damper.min_response_limit
                ));
                ui.label(format!("min clamp: {:.2}", self.config.damper.min_clamp));
                ui.label(format!(
                    "rate threshold: {:.2} rad/s",
                    self.config.damper.threshold
                ));
            } else {
                ui.label("fixed-parameter damper");
            }

            if let Some(summary) = &self.summary {
                ui.separator();
                ui.heading("Last run");
                ui.label(summary);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut error_points = Vec::new();
            let mut response_points = Vec::new();
            let mut clamp_points = Vec::new();
            for frame in &frames {
                if let Some(s) = frame.snapshot {
                    let t = s.tick_id as f64;
                    error_points.push([t, s.error_angle_deg]);
                    response_points.push([t, s.response_limit]);
                    clamp_points.push([t, s.clamp_factor]);
                }
            }

            Plot::new("damper_plot")
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    plot_ui.line(Line::new(PlotPoints::from(error_points)).name("error angle (deg)"));
                    plot_ui
                        .line(Line::new(PlotPoints::from(response_points)).name("response limit"));
                    plot_ui.line(Line::new(PlotPoints::from(clamp_points)).name("clamp factor"));
                });
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

fn main() -> Result<(), eframe::Error> {
    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "configs/damper_baseline.toml".to_string());
    let mode = args.get(2).cloned().unwrap_or_else(|| "threaded".to_string());

    let config = load_config(&config_path).expect("Failed to load config");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(1100.0, 700.0)),
        ..Default::default()
    };
    eframe::run_native(
        "Wobble Damper Dashboard",
        options,
        Box::new(move |_cc| Box::new(DashboardApp::new(config, config_path, mode))),
    )
}
