//! platform services of a linux host
//! a restart ends the process with RESTART_EXIT_CODE, the service manager
//! is expected to start it again

use std::fs;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use super::traits::platform::{Platform, PlatformFamily, RestartReason};
use crate::{info, warn};

const LOG_TAG: &str = "host_platform";

pub const RESTART_EXIT_CODE: i32 = 75;
const NET_CLASS_DIR: &str = "/sys/class/net";

pub struct HostPlatform {
    family: PlatformFamily,
    started: Instant,
    hardware_address: u64,
}

impl HostPlatform {
    /// `hardware_address` overrides the address read from the network interfaces
    pub fn new(family: PlatformFamily, hardware_address: Option<u64>) -> Self {
        let hardware_address = hardware_address.unwrap_or_else(|| {
            read_interface_address().unwrap_or_else(|| {
                warn!(LOG_TAG, "no hardware address found, unique id will be 0");
                0
            })
        });
        HostPlatform {
            family,
            started: Instant::now(),
            hardware_address,
        }
    }
}

/// parse "24:6f:28:ab:cd:ef" into an integer
pub fn parse_mac(raw: &str) -> Option<u64> {
    let hex: String = raw.trim().chars().filter(|c| *c != ':').collect();
    if hex.len() != 12 {
        return None;
    }
    u64::from_str_radix(hex.as_str(), 16).ok()
}

/// first non-zero address of a non-loopback interface, in name order
fn read_interface_address() -> Option<u64> {
    let mut names: Vec<String> = fs::read_dir(NET_CLASS_DIR)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name != "lo")
        .collect();
    names.sort();

    names.iter().find_map(|name| {
        let raw = fs::read_to_string(format!("{}/{}/address", NET_CLASS_DIR, name)).ok()?;
        parse_mac(raw.as_str()).filter(|addr| *addr != 0)
    })
}

impl Platform for HostPlatform {
    fn family(&self) -> PlatformFamily {
        self.family
    }

    fn millis(&self) -> u32 {
        // truncation gives the wrapping counter
        self.started.elapsed().as_millis() as u32
    }

    fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn delay(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }

    fn restart(&mut self, reason: RestartReason) {
        info!(LOG_TAG, "restarting device, reason: {:?}", reason);
        log::logger().flush();
        process::exit(RESTART_EXIT_CODE);
    }

    fn hardware_address(&self) -> u64 {
        self.hardware_address
    }

    fn core_id(&self) -> Option<u32> {
        match self.family {
            PlatformFamily::MultiCore => Some(1),
            PlatformFamily::SingleCore => None,
        }
    }
}
