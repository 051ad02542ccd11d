use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::VesselState;

/// Damper output captured alongside the vessel state for live display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamperSnapshot {
    pub tick_id: u64,
    pub error_angle_deg: f64,
    pub clamp_factor: f64,
    pub response_limit: f64,
    pub damped: bool,
}

/// Real-time data point for dashboard visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardFrame {
    pub timestamp_ns: u64,
    pub state: Option<VesselState>,
    pub snapshot: Option<DamperSnapshot>,
}

/// Thread-safe dashboard data buffer, bounded to the most recent entries.
#[derive(Clone)]
pub struct DashboardBuffer {
    data: Arc<Mutex<Vec<DashboardFrame>>>,
    max_size: usize,
}

impl DashboardBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::with_capacity(max_size))),
            max_size,
        }
    }

    pub fn add(&self, item: DashboardFrame) {
        let mut buffer = self.data.lock().unwrap();
        buffer.push(item);

        // Keep only the most recent data
        if buffer.len() > self.max_size {
            buffer.remove(0);
        }
    }

    pub fn get_recent(&self, count: usize) -> Vec<DashboardFrame> {
        let buffer = self.data.lock().unwrap();
        let start = buffer.len().saturating_sub(count);
        buffer[start..].to_vec()
    }

    pub fn get_all(&self) -> Vec<DashboardFrame> {
        self.data.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.data.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
