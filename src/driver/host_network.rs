//! network link of a linux host
//! the host is attached when the kernel has a route to the broker; joining and
//! leaving the access point itself is left to the os network manager

use std::fs;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};

use super::traits::network::{Credentials, Network};
use super::traits::platform::PlatformFamily;
use crate::{debug, info, warn};

const LOG_TAG: &str = "host_network";

const WIRELESS_STATS: &str = "/proc/net/wireless";
/// reported when no wireless interface exists
const NO_SIGNAL_DBM: i32 = -127;

pub struct HostNetwork {
    family: PlatformFamily,
    // probe target, the broker
    probe_host: String,
    probe_port: u16,
    // resolved on begin and reattach only, health checks never hit the resolver
    probe_addr: Option<SocketAddr>,
    hostname: String,
    ssid: String,
    tx_power: Option<i8>,
    enabled: bool,
}

impl HostNetwork {
    pub fn new(family: PlatformFamily, probe_host: &str, probe_port: u16) -> Self {
        HostNetwork {
            family,
            probe_host: probe_host.to_string(),
            probe_port,
            probe_addr: None,
            hostname: String::new(),
            ssid: String::new(),
            tx_power: None,
            enabled: false,
        }
    }

    pub fn hostname(&self) -> &str {
        self.hostname.as_str()
    }

    fn resolve_probe(&mut self) {
        self.probe_addr = (self.probe_host.as_str(), self.probe_port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next());
        if self.probe_addr.is_none() {
            warn!(LOG_TAG, "cannot resolve {}, link stays down until reattach", self.probe_host);
        }
    }

    /// local address the kernel would use to reach the broker
    fn route_source(&self) -> Option<IpAddr> {
        let target = self.probe_addr?;
        let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind).ok()?;
        socket.connect(target).ok()?;
        socket.local_addr().ok().map(|addr| addr.ip())
    }
}

/// signal level of the first wireless interface in /proc/net/wireless
fn parse_signal_level(stats: &str) -> Option<i32> {
    // two header lines, then: iface: status link level noise ...
    let line = stats.lines().nth(2)?;
    let level = line.split_whitespace().nth(3)?;
    level.trim_end_matches('.').parse::<f32>().ok().map(|v| v as i32)
}

impl Network for HostNetwork {
    fn set_hostname(&mut self, hostname: &str) {
        debug!(LOG_TAG, "hostname: {}", hostname);
        self.hostname = hostname.to_string();
    }

    fn begin(&mut self, credentials: &Credentials) {
        info!(LOG_TAG, "using host network, ssid: {}", credentials.ssid);
        self.ssid = credentials.ssid.clone();
        self.resolve_probe();
        self.enabled = true;
    }

    fn is_attached(&self) -> bool {
        self.enabled && self.route_source().is_some()
    }

    fn reattach(&mut self) {
        warn!(LOG_TAG, "host network is managed by the os, waiting for route to {}", self.probe_host);
        self.resolve_probe();
        self.enabled = true;
    }

    fn detach(&mut self) {
        info!(LOG_TAG, "host network detached");
        self.enabled = false;
    }

    fn set_transmit_power(&mut self, dbm: i8) {
        self.tx_power = Some(dbm);
    }

    fn transmit_power(&self) -> Option<i8> {
        match self.family {
            PlatformFamily::MultiCore => self.tx_power,
            PlatformFamily::SingleCore => None,
        }
    }

    fn local_address(&self) -> Option<IpAddr> {
        self.route_source()
    }

    fn signal_strength(&self) -> i32 {
        fs::read_to_string(WIRELESS_STATS)
            .ok()
            .and_then(|stats| parse_signal_level(stats.as_str()))
            .unwrap_or(NO_SIGNAL_DBM)
    }

    fn network_name(&self) -> String {
        self.ssid.clone()
    }
}
