use serde::{Deserialize, Serialize};

pub mod config;
pub mod damper;
pub mod dashboard;
pub mod diagnostics;
pub mod metrics;
pub mod pid;

pub use config::{DamperConfig, ExperimentConfig};
pub use damper::{AdaptiveDamper, TickInput, TickOutcome};
pub use dashboard::{DamperSnapshot, DashboardBuffer, DashboardFrame};
pub use diagnostics::SharedDiagnostics;
pub use metrics::TelemetryRecorder;
pub use pid::{AttitudePids, AxisPid, Gains};

/// Direction vector in the vessel body frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Snapshot of the simulated vessel, published once per physics tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VesselState {
    pub tick_id: u64,
    pub timestamp_ns: u64,
    pub vessel: u32,
    /// Autopilot target orientation, already transformed into the body frame.
    pub target_dir: Vec3,
    /// Angular velocity magnitude, rad/s.
    pub angular_rate: f64,
    pub pitch_error_deg: f64,
    pub yaw_error_deg: f64,
    pub roll_error_deg: f64,
    /// Scheduling jitter of this physics tick.
    pub lateness_ns: i64,
}

/// Normalized steering command sent back to the vessel, one entry per axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TorqueCommand {
    pub tick_id: u64,
    pub timestamp_ns: u64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl TorqueCommand {
    pub fn zero() -> Self {
        Self {
            tick_id: 0,
            timestamp_ns: 0,
            pitch: 0.0,
            roll: 0.0,
            yaw: 0.0,
        }
    }
}
