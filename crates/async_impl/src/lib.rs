mod autopilot;
mod vessel;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration, Instant};

use common::{DashboardBuffer, ExperimentConfig, SharedDiagnostics, TelemetryRecorder};

/// Runs the Tokio-based wobble-damper experiment for the configured duration
/// and returns the telemetry recorder.
pub async fn run_experiment(config: ExperimentConfig) -> TelemetryRecorder {
    run_experiment_with_dashboard(config, None).await
}

pub async fn run_experiment_with_dashboard(
    config: ExperimentConfig,
    dashboard: Option<DashboardBuffer>,
) -> TelemetryRecorder {
    let recorder = TelemetryRecorder::new();
    let diagnostics = Arc::new(SharedDiagnostics::default());
    let shutdown = Arc::new(AtomicBool::new(false));
    let start_time = Instant::now();

    let (state_tx, state_rx) = mpsc::channel(64);
    let (command_tx, command_rx) = mpsc::channel(64);
    let (frame_tx, frame_rx) = mpsc::channel(64);

    let vessel_handle = tokio::spawn(vessel::run_vessel_task(
        config.clone(),
        state_tx,
        command_rx,
        Arc::clone(&diagnostics),
        Arc::clone(&shutdown),
        start_time,
    ));

    let autopilot_handle = tokio::spawn(autopilot::run_autopilot_task(
        config.clone(),
        state_rx,
        command_tx,
        frame_rx,
        recorder.clone(),
        Arc::clone(&diagnostics),
        Arc::clone(&shutdown),
        start_time,
        dashboard,
    ));

    // Render-frame ticker: its only job is to re-arm the damper.
    let frame_handle = {
        let period = Duration::from_millis(config.frame_period_ms.max(1));
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            while !shutdown.load(Ordering::Relaxed) {
                sleep(period).await;
                let _ = frame_tx.try_send(());
            }
        })
    };

    sleep(Duration::from_secs(config.duration_secs)).await;
    shutdown.store(true, Ordering::Relaxed);

    let _ = vessel_handle.await;
    let _ = autopilot_handle.await;
    let _ = frame_handle.await;

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

    fn test_config(name: &str, pitch_error: f64) -> ExperimentConfig {
        ExperimentConfig {
            experiment_name: name.to_string(),
            duration_secs: 1,
            physics_period_ms: 5,
            frame_period_ms: 2,
            mode: "async".to_string(),
            enable_logging: false,
            initial_pitch_error_deg: pitch_error,
            initial_yaw_error_deg: 0.0,
            initial_roll_error_deg: 0.0,
            initial_pitch_rate_deg: 0.0,
            initial_yaw_rate_deg: 0.0,
            initial_roll_rate_deg: 0.0,
            control_authority: 150.0,
            divergence_limit_deg: 45.0,
            damper: DamperConfig::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn still_vessel_settles_into_damping() {
        let recorder = run_experiment(test_config("still_async", 0.0)).await;
        let results = recorder.get_results();
        assert!(!results.is_empty());

        for r in &results {
            assert!((0.3..=1.0).contains(&r.response_limit));
            assert!((0.2..=1.0).contains(&r.clamp_factor));
        }

        let last = results.last().unwrap();
        assert!(last.damped);
        assert_eq!(last.clamp_factor, 0.2);
        assert!(last.response_limit < 1.0);
    }
}
