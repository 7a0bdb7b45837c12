//! in-memory collaborators for unit tests: one shared world with a call
//! journal and a virtual millisecond clock that only moves on `delay`

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use super::traits::admin::{AdminPage, AdminRequest, AdminServer};
use super::traits::bus::{BusClient, LastWill};
use super::traits::network::{Credentials, Network};
use super::traits::platform::{Platform, PlatformFamily, RestartReason};
use crate::common::error::{ErrorCode, PropError};
use crate::entity::dto::inbound_message_dto::InboundMessageDto;

pub const HARDWARE_ADDRESS: u64 = 0x246F_28AB_CDEF;
pub const UNIQUE_ID: &str = "ABCDEF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetHostname(String),
    NetworkBegin(String),
    Reattach,
    Detach,
    SetTxPower(i8),
    Connect {
        client_id: String,
        will_topic: String,
        will_payload: String,
        retain: bool,
    },
    Publish {
        topic: String,
        payload: String,
        retain: bool,
    },
    Subscribe(String),
    Disconnect,
    KeepAlive(u16),
    Delay(u32),
    Restart(RestartReason),
}

#[derive(Debug)]
pub struct World {
    pub calls: Vec<Call>,
    pub now: u32,
    pub family: PlatformFamily,
    pub attached: bool,
    /// failed polls before a join succeeds, None never joins
    pub attach_after_polls: Option<u32>,
    attach_countdown: Option<u32>,
    pub reattach_succeeds: bool,
    pub tx_power: Option<i8>,
    pub connected: bool,
    /// how many of the next handshakes fail
    pub connect_failures: u32,
    /// handshakes succeed but the broker drops the session at once
    pub session_taken_over: bool,
    pub inbound: VecDeque<InboundMessageDto>,
    pub admin_page: Option<AdminPage>,
    pub admin_requests: Vec<AdminRequest>,
}

impl Default for World {
    fn default() -> Self {
        World {
            calls: Vec::new(),
            now: 0,
            family: PlatformFamily::MultiCore,
            attached: false,
            attach_after_polls: Some(0),
            attach_countdown: None,
            reattach_succeeds: false,
            tx_power: None,
            connected: false,
            connect_failures: 0,
            session_taken_over: false,
            inbound: VecDeque::new(),
            admin_page: None,
            admin_requests: Vec::new(),
        }
    }
}

impl World {
    pub fn publishes(&self) -> Vec<(String, String, bool)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Publish {
                    topic,
                    payload,
                    retain,
                } => Some((topic.clone(), payload.clone(), *retain)),
                _ => None,
            })
            .collect()
    }

    pub fn publishes_to(&self, topic: &str) -> Vec<(String, bool)> {
        self.publishes()
            .into_iter()
            .filter(|(t, _, _)| t == topic)
            .map(|(_, payload, retain)| (payload, retain))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn restarts(&self) -> usize {
        self.count(|c| matches!(c, Call::Restart(_)))
    }

    /// simulate the radio dropping out of the network
    pub fn lose_link(&mut self) {
        self.attached = false;
        self.attach_countdown = None;
        self.connected = false;
    }

    pub fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back(InboundMessageDto::new(topic, payload));
    }
}

pub type SharedWorld = Arc<Mutex<World>>;

pub fn world() -> SharedWorld {
    Arc::new(Mutex::new(World::default()))
}

pub struct FakeNetwork(pub SharedWorld);

impl Network for FakeNetwork {
    fn set_hostname(&mut self, hostname: &str) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::SetHostname(hostname.to_string()));
    }

    fn begin(&mut self, credentials: &Credentials) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::NetworkBegin(credentials.ssid.clone()));
        w.attach_countdown = w.attach_after_polls;
    }

    fn is_attached(&self) -> bool {
        let mut w = self.0.lock().unwrap();
        if !w.attached {
            match w.attach_countdown {
                Some(0) => w.attached = true,
                Some(n) => w.attach_countdown = Some(n - 1),
                None => {}
            }
        }
        w.attached
    }

    fn reattach(&mut self) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::Reattach);
        if w.reattach_succeeds {
            w.attached = true;
        }
    }

    fn detach(&mut self) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::Detach);
        w.attached = false;
        w.attach_countdown = None;
    }

    fn set_transmit_power(&mut self, dbm: i8) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::SetTxPower(dbm));
        w.tx_power = Some(dbm);
    }

    fn transmit_power(&self) -> Option<i8> {
        let w = self.0.lock().unwrap();
        match w.family {
            PlatformFamily::MultiCore => w.tx_power,
            PlatformFamily::SingleCore => None,
        }
    }

    fn local_address(&self) -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)))
    }

    fn signal_strength(&self) -> i32 {
        -61
    }

    fn network_name(&self) -> String {
        "props".to_string()
    }
}

pub struct FakeBus(pub SharedWorld);

impl BusClient for FakeBus {
    fn connect(&mut self, client_id: &str, last_will: &LastWill) -> Result<(), PropError> {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::Connect {
            client_id: client_id.to_string(),
            will_topic: last_will.topic.to_string(),
            will_payload: last_will.payload.to_string(),
            retain: last_will.retain,
        });
        if w.connect_failures > 0 {
            w.connect_failures -= 1;
            return Err(PropError::new(ErrorCode::MqttError, "connection refused"));
        }
        w.connected = !w.session_taken_over;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.0.lock().unwrap().connected
    }

    fn disconnect(&mut self) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::Disconnect);
        w.connected = false;
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), PropError> {
        let mut w = self.0.lock().unwrap();
        if !w.connected {
            return Err(PropError::new(ErrorCode::MqttError, "not connected"));
        }
        w.calls.push(Call::Publish {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).to_string(),
            retain,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), PropError> {
        let mut w = self.0.lock().unwrap();
        if !w.connected {
            return Err(PropError::new(ErrorCode::MqttError, "not connected"));
        }
        w.calls.push(Call::Subscribe(topic.to_string()));
        Ok(())
    }

    fn set_keep_alive(&mut self, secs: u16) {
        self.0.lock().unwrap().calls.push(Call::KeepAlive(secs));
    }

    fn pump(&mut self) -> Vec<InboundMessageDto> {
        self.0.lock().unwrap().inbound.drain(..).collect()
    }
}

pub struct FakePlatform(pub SharedWorld);

impl Platform for FakePlatform {
    fn family(&self) -> PlatformFamily {
        self.0.lock().unwrap().family
    }

    fn millis(&self) -> u32 {
        self.0.lock().unwrap().now
    }

    fn delay(&mut self, ms: u32) {
        let mut w = self.0.lock().unwrap();
        w.calls.push(Call::Delay(ms));
        w.now = w.now.wrapping_add(ms);
    }

    fn restart(&mut self, reason: RestartReason) {
        self.0.lock().unwrap().calls.push(Call::Restart(reason));
    }

    fn hardware_address(&self) -> u64 {
        HARDWARE_ADDRESS
    }

    fn core_id(&self) -> Option<u32> {
        match self.family() {
            PlatformFamily::MultiCore => Some(1),
            PlatformFamily::SingleCore => None,
        }
    }
}

pub struct FakeAdmin(pub SharedWorld);

impl AdminServer for FakeAdmin {
    fn begin(&mut self, page: AdminPage) -> Result<(), PropError> {
        self.0.lock().unwrap().admin_page = Some(page);
        Ok(())
    }

    fn handle_client(&mut self) -> Vec<AdminRequest> {
        self.0.lock().unwrap().admin_requests.drain(..).collect()
    }
}
