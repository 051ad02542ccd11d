use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use common::damper::error_angle;
use common::metrics::TickRecord;
use common::{
    AdaptiveDamper, AttitudePids, DamperSnapshot, DashboardBuffer, DashboardFrame,
    ExperimentConfig, SharedDiagnostics, TelemetryRecorder, TickInput, TickOutcome, TorqueCommand,
    VesselState,
};

#[allow(clippy::too_many_arguments)]
pub async fn run_autopilot_task(
    config: ExperimentConfig,
    mut state_rx: mpsc::Receiver<VesselState>,
    command_tx: mpsc::Sender<TorqueCommand>,
    mut frame_rx: mpsc::Receiver<()>,
    recorder: TelemetryRecorder,
    diagnostics: Arc<SharedDiagnostics>,
    shutdown: Arc<AtomicBool>,
    start_time: Instant,
    dashboard: Option<DashboardBuffer>,
) {
    let mut damper = AdaptiveDamper::new(config.damper);
    let mut pids = AttitudePids::new();
    let dt = config.physics_period_ms as f64 / 1000.0;
    let mut was_damped = false;

    loop {
        let state = match state_rx.recv().await {
            Some(state) => state,
            None => break,
        };
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        // Frame invalidation must be seen before this tick is processed.
        while frame_rx.try_recv().is_ok() {
            damper.begin_frame();
        }

        let input = TickInput {
            vessel: state.vessel,
            target_dir: state.target_dir,
            angular_rate: state.angular_rate,
        };
        let damped = match damper.on_tick(Some(input), Some(&mut pids)) {
            TickOutcome::Applied { damped } => damped,
            TickOutcome::AlreadyServiced => {
                diagnostics.record_serviced_skip();
                continue;
            }
            TickOutcome::Skipped => {
                diagnostics.record_skipped();
                continue;
            }
        };
        if damped {
            diagnostics.record_damped();
        }

        if config.enable_logging && damped != was_damped {
            let elapsed = start_time.elapsed().as_secs_f64();
            if damped {
                println!(
                    "[{:>8}] [DAMPER] Authority reduced: clamp {:.2}, response limit {:.2}",
                    format!("{:.3}s", elapsed),
                    damper.clamp_factor(),
                    damper.response_limit()
                );
            } else {
                println!(
                    "[{:>8}] [DAMPER] Full authority restored",
                    format!("{:.3}s", elapsed)
                );
            }
        }
        was_damped = damped;

        let timestamp_ns = start_time.elapsed().as_nanos() as u64;
        let command = TorqueCommand {
            tick_id: state.tick_id,
            timestamp_ns,
            pitch: pids.pitch.compute(state.pitch_error_deg, dt),
            roll: pids.roll.compute(state.roll_error_deg, dt),
            yaw: pids.yaw.compute(state.yaw_error_deg, dt),
        };
        let _ = command_tx.try_send(command);

        let error_deg = error_angle(state.target_dir);
        recorder.record(TickRecord {
            tick_id: state.tick_id,
            mode: config.mode.clone(),
            time_ns: state.timestamp_ns,
            error_angle_deg: error_deg,
            angular_rate: state.angular_rate,
            clamp_factor: damper.clamp_factor(),
            response_limit: damper.response_limit(),
            damped,
            lateness_ns: state.lateness_ns,
        });

        if let Some(dashboard) = &dashboard {
            dashboard.add(DashboardFrame {
                timestamp_ns,
                state: Some(state),
                snapshot: Some(DamperSnapshot {
                    tick_id: state.tick_id,
                    error_angle_deg: error_deg,
                    clamp_factor: damper.clamp_factor(),
                    response_limit: damper.response_limit(),
                    damped,
                }),
            });
        }
    }
}
