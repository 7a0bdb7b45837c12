use serde::Deserialize;

/// hardware family the prop runs on, selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFamily {
    /// more than one execution context: the loop gets its own, core id and
    /// transmit power are reported
    MultiCore,
    /// the application drives `tick()` from its own loop
    SingleCore,
}

impl PlatformFamily {
    pub fn has_dedicated_context(self) -> bool {
        self == PlatformFamily::MultiCore
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    LinkAttachTimeout,
    BusRetriesExhausted,
    RebootCommand,
    AdminReboot,
}

pub trait Platform {
    fn family(&self) -> PlatformFamily;

    /// monotonic millisecond counter, wraps around at u32::MAX
    fn millis(&self) -> u32;

    fn uptime_secs(&self) -> u64 {
        (self.millis() / 1000) as u64
    }

    /// cooperative wait, other work of the device keeps running
    fn delay(&mut self, ms: u32);

    /// full device restart; on hardware this does not return
    fn restart(&mut self, reason: RestartReason);

    /// 48 or 64 bit hardware-unique address
    fn hardware_address(&self) -> u64;

    /// execution context the caller runs on, None on single context hardware
    fn core_id(&self) -> Option<u32>;
}
