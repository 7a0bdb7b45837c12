//! puzzle flags and status cadence owned by the application
//! the flags are independent, no combination is rejected

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

pub const DEFAULT_UPDATE_INTERVAL_MS: u32 = 30_000;

/// shared between the application and the supervisory loop,
/// each value is a single atomic so there is no torn state to observe
#[derive(Debug)]
pub struct RuntimeFlagsBo {
    enabled: AtomicBool,
    active: AtomicBool,
    solved: AtomicBool,
    // 0 disables periodic status
    update_interval_ms: AtomicU32,
}

impl Default for RuntimeFlagsBo {
    fn default() -> Self {
        RuntimeFlagsBo::new(DEFAULT_UPDATE_INTERVAL_MS)
    }
}

impl RuntimeFlagsBo {
    pub fn new(update_interval_ms: u32) -> Self {
        RuntimeFlagsBo {
            enabled: AtomicBool::new(false),
            active: AtomicBool::new(false),
            solved: AtomicBool::new(false),
            update_interval_ms: AtomicU32::new(update_interval_ms),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_solved(&self, solved: bool) {
        self.solved.store(solved, Ordering::Relaxed);
    }

    pub fn is_solved(&self) -> bool {
        self.solved.load(Ordering::Relaxed)
    }

    /// intervals beyond u32 milliseconds are clamped
    pub fn set_update_interval(&self, interval: Duration) {
        let millis = interval.as_millis().min(u32::MAX as u128) as u32;
        self.update_interval_ms.store(millis, Ordering::Relaxed);
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms() as u64)
    }

    pub fn update_interval_ms(&self) -> u32 {
        self.update_interval_ms.load(Ordering::Relaxed)
    }
}
