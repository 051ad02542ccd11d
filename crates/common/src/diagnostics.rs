use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared between harness threads.
#[derive(Default)]
pub struct SharedDiagnostics {
    /// Ticks skipped for lack of a vessel or controllers.
    pub skipped_ticks: AtomicU64,
    /// Ticks where the vessel was already serviced since the last frame.
    pub serviced_skips: AtomicU64,
    /// Ticks the damper spent with reduced authority.
    pub damped_ticks: AtomicU64,
    /// Physics ticks where the error angle exceeded the divergence limit.
    pub divergence_events: AtomicU64,
}

impl SharedDiagnostics {
    pub fn record_skipped(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_serviced_skip(&self) {
        self.serviced_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_damped(&self) {
        self.damped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_divergence(&self) {
        self.divergence_events.fetch_add(1, Ordering::Relaxed);
    }
}
