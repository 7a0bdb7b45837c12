//! 道具设备
//! - 上电后接入网络，连接 mqtt，发送 boot 信息
//! - 每个 tick 依次检查链路、检查总线并分发消息、处理管理页面、定时上报状态
//! - 链路或总线无法恢复时重启设备

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use super::link_supervisor::{LinkState, LinkSupervisor};
use super::status_reporter::StatusReporter;
use crate::common::error::{ErrorCode, PropError};
use crate::driver::traits::admin::{AdminPage, AdminRequest, AdminServer};
use crate::driver::traits::bus::BusClient;
use crate::driver::traits::network::{Credentials, Network};
use crate::driver::traits::platform::{Platform, PlatformFamily, RestartReason};
use crate::entity::bo::device_identity_bo::DeviceIdentityBo;
use crate::entity::bo::runtime_flags_bo::RuntimeFlagsBo;
use crate::entity::dto::inbound_message_dto::InboundMessageDto;
use crate::mqtt_client::client::{BusSupervisor, DEFAULT_KEEP_ALIVE_SECS};
use crate::mqtt_client::message_listener::{CommandDispatcher, Dispatch};
use crate::mqtt_client::protocol::{Topic, TopicSet};
use crate::{error, info, warn};

const LOG_TAG: &str = "prop";

/// pause between ticks of the supervisory loop
pub const LOOP_YIELD_MS: u32 = 10;
/// lets the last will reach the broker before the restart
pub const REBOOT_PAUSE_MS: u32 = 1_000;

/// collaborators a prop drives, owned by it from construction on
pub struct PropDrivers {
    pub network: Box<dyn Network + Send>,
    pub bus: Box<dyn BusClient + Send>,
    pub platform: Box<dyn Platform + Send>,
    pub admin: Option<Box<dyn AdminServer + Send>>,
}

pub struct Prop {
    identity: DeviceIdentityBo,
    topics: TopicSet,
    link: LinkSupervisor,
    bus: BusSupervisor,
    reporter: StatusReporter,
    dispatcher: CommandDispatcher,
    platform: Box<dyn Platform + Send>,
    admin: Option<Box<dyn AdminServer + Send>>,
    flags: Arc<RuntimeFlagsBo>,
    // set once a restart was requested, every later tick is a no-op
    halted: bool,
}

impl Prop {
    pub fn new(room: &str, name: &str, use_id: bool, version: &str, drivers: PropDrivers) -> Self {
        let identity = DeviceIdentityBo::new(room, name, use_id, version, drivers.platform.hardware_address());
        let topics = TopicSet::derive(&identity);
        let bus = BusSupervisor::new(drivers.bus, identity.unique_id(), DEFAULT_KEEP_ALIVE_SECS);

        Prop {
            identity,
            topics,
            link: LinkSupervisor::new(drivers.network),
            bus,
            reporter: StatusReporter::new(),
            dispatcher: CommandDispatcher::new(),
            platform: drivers.platform,
            admin: drivers.admin,
            flags: Arc::new(RuntimeFlagsBo::default()),
            halted: false,
        }
    }

    /// application handler for every inbound message except the reboot command
    pub fn add_callback(&mut self, handler: impl FnMut(&str, &[u8]) + Send + 'static) {
        self.dispatcher.set_handler(Box::new(handler));
    }

    /// application fields merged into every status record
    pub fn add_status_callback(&mut self, hook: impl FnMut(&mut Map<String, Value>) + Send + 'static) {
        self.reporter.set_status_hook(Box::new(hook));
    }

    pub fn set_keep_alive(&mut self, secs: u16) {
        self.bus.set_keep_alive(secs);
    }

    /// attach, connect and announce; blocks until done or the device restarts
    pub fn begin(&mut self, credentials: &Credentials) -> Result<(), PropError> {
        info!(
            LOG_TAG,
            "starting prop, name: {}, version: {}, id: {}",
            self.identity.name(),
            self.identity.version(),
            self.identity.unique_id()
        );

        if let Err(e) = self.link.attach(self.identity.name(), credentials, self.platform.as_mut()) {
            return Err(self.escalate(e));
        }
        if let Err(e) = self.bus.connect(&self.topics, self.platform.as_mut()) {
            return Err(self.escalate(e));
        }

        if let Some(admin) = self.admin.as_mut() {
            let page = AdminPage {
                name: self.identity.name().to_string(),
                version: self.identity.version().to_string(),
                id: self.identity.unique_id().to_string(),
            };
            if let Err(e) = admin.begin(page) {
                warn!(LOG_TAG, "admin page unavailable: {}", e);
            }
        }

        self.send_boot();
        Ok(())
    }

    /// one pass of the supervisory loop, never blocks once `begin` succeeded
    /// except for bus reconnects
    pub fn tick(&mut self) {
        if self.halted {
            return;
        }

        // 1 link health
        let link_state = self.link.check_health(self.platform.as_ref());

        // 2 bus health and inbound messages, only over a live link
        if link_state == LinkState::Attached {
            if let Err(e) = self.bus.check_health(&self.topics, self.platform.as_mut()) {
                self.escalate(e);
                return;
            }
            for msg in self.bus.pump() {
                self.on_message(&msg);
                if self.halted {
                    return;
                }
            }
        }

        // 3 local admin page
        self.serve_admin();
        if self.halted {
            return;
        }

        // 4 periodic status
        self.reporter.check_timer(
            &mut self.bus,
            self.topics.status(),
            &self.flags,
            self.platform.as_ref(),
            self.link.network(),
        );
    }

    /// cooperative pause between two ticks
    pub fn idle(&mut self) {
        self.platform.delay(LOOP_YIELD_MS);
    }

    pub fn send_status(&mut self) {
        self.reporter.send_status(
            &mut self.bus,
            self.topics.status(),
            &self.flags,
            self.platform.as_ref(),
            self.link.network(),
        );
    }

    /// boot telemetry, only the first call after connecting publishes
    pub fn send_boot(&mut self) {
        self.reporter.send_boot(
            &mut self.bus,
            self.topics.telemetry(),
            &self.identity,
            self.platform.as_ref(),
            self.link.network(),
        );
    }

    /// best-effort publish of an application document
    pub fn publish_json(&mut self, topic: &str, doc: &Value, retain: bool) -> Result<(), PropError> {
        let json = serde_json::to_string(doc).map_err(|e| PropError {
            code: ErrorCode::MqttError,
            msg: format!("cannot serialize document for {topic}: {e}"),
        })?;
        self.bus.publish(topic, json.as_bytes(), retain);
        Ok(())
    }

    pub fn subscribe(&mut self, topic: &str) -> Result<(), PropError> {
        self.bus.subscribe(topic)
    }

    fn on_message(&mut self, msg: &InboundMessageDto) {
        match self.dispatcher.on_message(msg) {
            Dispatch::Reboot => {
                self.reboot(RestartReason::RebootCommand);
                return;
            }
            Dispatch::Forwarded | Dispatch::Dropped => {}
        }
        // a command may have changed state, tell the bus right away
        self.send_status();
    }

    fn serve_admin(&mut self) {
        let requests = match self.admin.as_mut() {
            Some(admin) => admin.handle_client(),
            None => return,
        };
        for request in requests {
            match request {
                AdminRequest::Reboot => {
                    info!(LOG_TAG, "reboot requested from admin page");
                    self.reboot(RestartReason::AdminReboot);
                    return;
                }
            }
        }
    }

    /// clean bus disconnect so the last will is the final word, then restart
    fn reboot(&mut self, reason: RestartReason) {
        info!(LOG_TAG, "rebooting, reason: {:?}", reason);
        self.bus.disconnect();
        self.link.detach();
        self.platform.delay(REBOOT_PAUSE_MS);
        self.platform.restart(reason);
        self.halted = true;
    }

    fn escalate(&mut self, e: PropError) -> PropError {
        if e.is_fatal() {
            error!(LOG_TAG, "device restart requested: {}", e);
            self.halted = true;
        } else {
            warn!(LOG_TAG, "supervision error: {}", e);
        }
        e
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn family(&self) -> PlatformFamily {
        self.platform.family()
    }

    pub fn identity(&self) -> &DeviceIdentityBo {
        &self.identity
    }

    pub fn unique_id(&self) -> &str {
        self.identity.unique_id()
    }

    pub fn status_topic(&self) -> &str {
        self.topics.status()
    }

    pub fn telemetry_topic(&self) -> &str {
        self.topics.telemetry()
    }

    pub fn last_will_topic(&self) -> &str {
        self.topics.last_will()
    }

    pub fn subscribe_topics(&self) -> &[Topic] {
        self.topics.subscribe_topics()
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn is_bus_connected(&self) -> bool {
        self.bus.is_connected()
    }

    /// handle for the application to read and set the runtime flags from any thread
    pub fn flags(&self) -> Arc<RuntimeFlagsBo> {
        self.flags.clone()
    }

    pub fn set_update_interval(&self, interval: Duration) {
        info!(LOG_TAG, "update interval set to: {:?}", interval);
        self.flags.set_update_interval(interval);
    }

    pub fn update_interval(&self) -> Duration {
        self.flags.update_interval()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.flags.set_enabled(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.is_enabled()
    }

    pub fn set_active(&self, active: bool) {
        self.flags.set_active(active);
    }

    pub fn is_active(&self) -> bool {
        self.flags.is_active()
    }

    pub fn set_solved(&self, solved: bool) {
        self.flags.set_solved(solved);
    }

    pub fn is_solved(&self) -> bool {
        self.flags.is_solved()
    }
}
