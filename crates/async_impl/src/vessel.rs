use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};

use common::damper::{error_angle, target_dir_from_errors};
use common::{ExperimentConfig, SharedDiagnostics, TorqueCommand, VesselState};

const VESSEL_ID: u32 = 1;

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

pub async fn run_vessel_task(
    config: ExperimentConfig,
    sender: mpsc::Sender<VesselState>,
    mut command_rx: mpsc::Receiver<TorqueCommand>,
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
        next_tick += period;
        sleep_until(next_tick).await;

        let actual = Instant::now();
        let timestamp_ns = actual.duration_since(start_time).as_nanos() as u64;
        let lateness_ns = actual.duration_since(next_tick).as_nanos() as i64;

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
