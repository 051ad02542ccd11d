use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::damper::{error_angle, target_dir_from_errors};
use common::{ExperimentConfig, SharedDiagnostics, TorqueCommand, VesselState};

const VESSEL_ID: u32 = 1;

/// One rotation axis of the simulated craft, integrated per physics tick.
struct Axis {
    error_deg: f64,
    rate_deg: f64,
}

impl Axis {
    fn new(error_deg: f64, rate_deg: f64) -> Self {
        Self { error_deg, rate_deg }
    }

    fn step(&mut self, command: f64, authority: f64, dt: f64) {
        self.rate_deg -= command * authority * dt;
        self.error_deg += self.rate_deg * dt;
    }
}

pub fn run_vessel_thread(
    config: ExperimentConfig,
    sender: SyncSender<VesselState>,
    command_rx: Receiver<TorqueCommand>,
    diagnostics: Arc<SharedDiagnostics>,
    shutdown: Arc<AtomicBool>,
    start_time: Instant,
) {
    let period = Duration::from_millis(config.physics_period_ms);
    let dt = period.as_secs_f64();
    let mut tick_id = 0u64;
    let mut next_tick = start_time;

    let mut pitch = Axis::new(config.initial_pitch_error_deg, config.initial_pitch_rate_deg);
    let mut yaw = Axis::new(config.initial_yaw_error_deg, config.initial_yaw_rate_deg);
    let mut roll = Axis::new(config.initial_roll_error_deg, config.initial_roll_rate_deg);
    let mut command = TorqueCommand::zero();

    while !shutdown.load(Ordering::Relaxed) {
        let expected = next_tick;
        next_tick += period;

        let now = Instant::now();
        if now < expected {
            thread::sleep(expected - now);
        }

        let actual = Instant::now();
        let timestamp_ns = actual.duration_since(start_time).as_nanos() as u64;
        let lateness_ns = actual.duration_since(expected).as_nanos() as i64;

        // Latest autopilot command wins; stale ones are drained away.
        while let Ok(cmd) = command_rx.try_recv() {
            command = cmd;
        }

        pitch.step(command.pitch, config.control_authority, dt);
        yaw.step(command.yaw, config.control_authority, dt);
        roll.step(command.roll, config.control_authority, dt);

        let rate_mag = (pitch.rate_deg.powi(2) + yaw.rate_deg.powi(2) + roll.rate_deg.powi(2))
            .sqrt()
            .to_radians();
        let target_dir = target_dir_from_errors(pitch.error_deg, yaw.error_deg);

        if error_angle(target_dir) > config.divergence_limit_deg {
            diagnostics.record_divergence();
            if config.enable_logging {
                let elapsed = start_time.elapsed().as_secs_f64();
                println!(
                    "[{:>8}] [VESSEL] Divergence: error angle {:.1} deg beyond {:.1} deg limit",
                    format!("{:.3}s", elapsed),
                    error_angle(target_dir),
                    config.divergence_limit_deg
                );
            }
        }

        let state = VesselState {
            tick_id,
            timestamp_ns,
            vessel: VESSEL_ID,
            target_dir,
            angular_rate: rate_mag,
            pitch_error_deg: pitch.error_deg,
            yaw_error_deg: yaw.error_deg,
            roll_error_deg: roll.error_deg,
            lateness_ns,
        };
        let _ = sender.try_send(state);

        tick_id += 1;
    }
}
