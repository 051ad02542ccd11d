use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// One autopilot tick as written to the telemetry CSV.
#[derive(Debug, Serialize, Clone)]
pub struct TickRecord {
    pub tick_id: u64,
    pub mode: String,
    pub time_ns: u64,
    pub error_angle_deg: f64,
    pub angular_rate: f64,
    pub clamp_factor: f64,
    pub response_limit: f64,
    pub damped: bool,
    pub lateness_ns: i64,
}

/// Thread-safe tick recorder. Clones share the same storage, so harness
/// threads and the caller can hold it at the same time.
#[derive(Clone)]
pub struct TelemetryRecorder {
    records: Arc<Mutex<Vec<TickRecord>>>,
    damped_ticks: Arc<AtomicUsize>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::with_capacity(10_000))),
            damped_ticks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn record(&self, record: TickRecord) {
        if let Ok(mut data) = self.records.lock() {
            if record.damped {
                self.damped_ticks.fetch_add(1, Ordering::Relaxed);
            }
            data.push(record);
        }
    }

    pub fn damped_ticks(&self) -> usize {
        self.damped_ticks.load(Ordering::Relaxed)
    }

    pub fn get_results(&self) -> Vec<TickRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn save_to_csv(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        let data = self.records.lock().unwrap();
        let mut wtr = csv::Writer::from_path(filename)?;
        for record in data.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        println!("Saved {} records to {}", data.len(), filename);
        Ok(())
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tick_id: u64, damped: bool) -> TickRecord {
        TickRecord {
            tick_id,
            mode: "test".to_string(),
            time_ns: tick_id * 20_000_000,
            error_angle_deg: 1.5,
            angular_rate: 0.1,
            clamp_factor: if damped { 0.3 } else { 1.0 },
            response_limit: 0.9,
            damped,
            lateness_ns: 0,
        }
    }

    #[test]
    fn clones_share_storage_and_counters() {
        let recorder = TelemetryRecorder::new();
        let clone = recorder.clone();
        clone.record(record(0, true));
        clone.record(record(1, false));
        recorder.record(record(2, true));

        assert_eq!(recorder.get_results().len(), 3);
        assert_eq!(recorder.damped_ticks(), 2);
    }
}
