mod autopilot;
mod vessel;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{DashboardBuffer, ExperimentConfig, SharedDiagnostics, TelemetryRecorder};

/// Runs the multi-threaded wobble-damper experiment for the configured
/// duration and returns the telemetry recorder.
pub fn run_experiment(config: ExperimentConfig) -> TelemetryRecorder {
    run_experiment_with_dashboard(config, None)
}

pub fn run_experiment_with_dashboard(
    config: ExperimentConfig,
    dashboard: Option<DashboardBuffer>,
) -> TelemetryRecorder {
    let recorder = TelemetryRecorder::new();
    let diagnostics = Arc::new(SharedDiagnostics::default());
    let shutdown = Arc::new(AtomicBool::new(false));
    let start_time = Instant::now();

    let (state_tx, state_rx) = mpsc::sync_channel(64);
    let (command_tx, command_rx) = mpsc::sync_channel(64);
    let (frame_tx, frame_rx) = mpsc::sync_channel(64);

    let vessel_handle = {
        let config = config.clone();
        let diagnostics = Arc::clone(&diagnostics);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            vessel::run_vessel_thread(config, state_tx, command_rx, diagnostics, shutdown, start_time)
        })
    };

    let autopilot_handle = {
        let config = config.clone();
        let recorder = recorder.clone();
        let diagnostics = Arc::clone(&diagnostics);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            autopilot::run_autopilot_thread(
                config,
                state_rx,
                command_tx,
                frame_rx,
                recorder,
                diagnostics,
                shutdown,
                start_time,
                dashboard,
            )
        })
    };

    // Render-frame ticker: its only job is to re-arm the damper.
    let frame_handle = {
        let period = Duration::from_millis(config.frame_period_ms.max(1));
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                thread::sleep(period);
                let _ = frame_tx.try_send(());
            }
        })
    };

    thread::sleep(Duration::from_secs(config.duration_secs));
    shutdown.store(true, Ordering::Relaxed);

    let _ = vessel_handle.join();
    let _ = autopilot_handle.join();
    let _ = frame_handle.join();

    if config.enable_logging {
        println!(
            "[SYSTEM] Run complete: {} damped ticks, {} redundant ticks, {} skipped, {} divergence events",
            diagnostics.damped_ticks.load(Ordering::Relaxed),
            diagnostics.serviced_skips.load(Ordering::Relaxed),
            diagnostics.skipped_ticks.load(Ordering::Relaxed),
            diagnostics.divergence_events.load(Ordering::Relaxed),
        );
    }

    recorder
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::DamperConfig;

    fn test_config(name: &str, pitch_error: f64, pitch_rate: f64) -> ExperimentConfig {
        ExperimentConfig {
            experiment_name: name.to_string(),
            duration_secs: 1,
            physics_period_ms: 5,
            frame_period_ms: 2,
            mode: "threaded".to_string(),
            enable_logging: false,
            initial_pitch_error_deg: pitch_error,
            initial_yaw_error_deg: 0.0,
            initial_roll_error_deg: 0.0,
            initial_pitch_rate_deg: pitch_rate,
            initial_yaw_rate_deg: 0.0,
            initial_roll_rate_deg: 0.0,
            control_authority: 150.0,
            divergence_limit_deg: 45.0,
            damper: DamperConfig::default(),
        }
    }

    #[test]
    fn still_vessel_settles_into_damping() {
        let recorder = run_experiment(test_config("still", 0.0, 0.0));
        let results = recorder.get_results();
        assert!(!results.is_empty());

        for r in &results {
            assert!((0.3..=1.0).contains(&r.response_limit));
            assert!((0.2..=1.0).contains(&r.clamp_factor));
        }

        // Zero error and zero rate from the start: every applied tick damps,
        // the clamp pins to its floor and the gain ramp heads down.
        let last = results.last().unwrap();
        assert!(last.damped);
        assert_eq!(last.clamp_factor, 0.2);
        assert!(last.response_limit < 1.0);
        assert!(recorder.damped_ticks() > 0);
    }

    #[test]
    fn wobbling_vessel_stays_within_bounds() {
        let recorder = run_experiment(test_config("wobble", 4.0, 10.0));
        let results = recorder.get_results();
        assert!(!results.is_empty());

        for r in &results {
            assert!((0.3..=1.0).contains(&r.response_limit));
            assert!((0.2..=1.0).contains(&r.clamp_factor));
            assert!(r.damped == (r.clamp_factor < 1.0));
        }
    }
}
