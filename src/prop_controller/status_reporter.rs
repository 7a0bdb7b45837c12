//! status and boot telemetry of the prop
//! status is published on the update interval and after every command,
//! boot telemetry exactly once

use serde_json::{Map, Value};

use crate::driver::traits::network::Network;
use crate::driver::traits::platform::Platform;
use crate::entity::bo::device_identity_bo::DeviceIdentityBo;
use crate::entity::bo::runtime_flags_bo::RuntimeFlagsBo;
use crate::entity::dto::status_dto::{AppCoreDto, BootDto, StatusDto, SysStateDto, RESERVED_STATUS_KEYS};
use crate::mqtt_client::client::BusSupervisor;
use crate::util::time::has_elapsed;
use crate::{error, info, warn};

const LOG_TAG: &str = "status_reporter";

/// lets the application add its own fields to every status record
pub type StatusHook = Box<dyn FnMut(&mut Map<String, Value>) + Send>;

#[derive(Default)]
pub struct StatusReporter {
    last_periodic: Option<u32>,
    boot_sent: bool,
    status_hook: Option<StatusHook>,
}

impl StatusReporter {
    pub fn new() -> Self {
        StatusReporter::default()
    }

    pub fn set_status_hook(&mut self, hook: StatusHook) {
        self.status_hook = Some(hook);
    }

    pub fn boot_sent(&self) -> bool {
        self.boot_sent
    }

    /// a zero interval never falls due; the first check after boot always does
    pub fn is_due(&self, now: u32, interval_ms: u32) -> bool {
        if interval_ms == 0 {
            return false;
        }
        match self.last_periodic {
            Some(last) => has_elapsed(now, last, interval_ms),
            None => true,
        }
    }

    pub fn status_record(
        &mut self,
        flags: &RuntimeFlagsBo,
        platform: &dyn Platform,
        network: &dyn Network,
    ) -> StatusDto {
        let mut extra = Map::new();
        if let Some(hook) = self.status_hook.as_mut() {
            hook(&mut extra);
            for key in RESERVED_STATUS_KEYS {
                if extra.remove(key).is_some() {
                    warn!(LOG_TAG, "status hook tried to set reserved key: {}", key);
                }
            }
        }

        StatusDto {
            sys: SysStateDto {
                uptime: platform.uptime_secs(),
                enabled: flags.is_enabled(),
                active: flags.is_active(),
                solved: flags.is_solved(),
                core: platform.core_id(),
            },
            tx_power: network.transmit_power(),
            extra,
        }
    }

    pub fn boot_record(identity: &DeviceIdentityBo, platform: &dyn Platform, network: &dyn Network) -> BootDto {
        BootDto {
            name: identity.name().to_string(),
            version: identity.version().to_string(),
            rssi: network.signal_strength(),
            tx_power: network.transmit_power(),
            ssid: network.network_name(),
            ipaddr: network
                .local_address()
                .map(|addr| addr.to_string())
                .unwrap_or_default(),
            id: identity.unique_id().to_string(),
            app: platform.core_id().map(|core| AppCoreDto { core }),
        }
    }

    /// publish the status record, retained
    pub fn send_status(
        &mut self,
        bus: &mut BusSupervisor,
        topic: &str,
        flags: &RuntimeFlagsBo,
        platform: &dyn Platform,
        network: &dyn Network,
    ) {
        let record = self.status_record(flags, platform, network);
        match record.to_json() {
            Ok(json) => bus.publish(topic, json.as_bytes(), true),
            Err(e) => error!(LOG_TAG, "cannot send status: {}", e),
        }
    }

    /// timer driven status, restarts the period whenever it fires
    pub fn check_timer(
        &mut self,
        bus: &mut BusSupervisor,
        topic: &str,
        flags: &RuntimeFlagsBo,
        platform: &dyn Platform,
        network: &dyn Network,
    ) -> bool {
        let now = platform.millis();
        if !self.is_due(now, flags.update_interval_ms()) {
            return false;
        }
        self.send_status(bus, topic, flags, platform, network);
        self.last_periodic = Some(now);
        true
    }

    /// retained boot telemetry, only the first call publishes
    pub fn send_boot(
        &mut self,
        bus: &mut BusSupervisor,
        topic: &str,
        identity: &DeviceIdentityBo,
        platform: &dyn Platform,
        network: &dyn Network,
    ) {
        if self.boot_sent {
            return;
        }
        info!(LOG_TAG, "sending boot info");
        match Self::boot_record(identity, platform, network).to_json() {
            Ok(json) => {
                bus.publish(topic, json.as_bytes(), true);
                self.boot_sent = true;
            }
            Err(e) => error!(LOG_TAG, "cannot send boot info: {}", e),
        }
    }
}
