//! setting config file

use std::env;
use std::fmt;
use std::fs;

use lazy_static::lazy_static;
use serde::Deserialize;

use super::error::{ErrorCode, PropError};
use crate::driver::traits::platform::PlatformFamily;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Env {
    pub debug: bool,
    pub env: String,
    pub log_level: String,
}

impl Default for Env {
    fn default() -> Self {
        Env {
            debug: false,
            env: "dev".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// identity and behaviour of the prop itself
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Prop {
    pub room: String,
    pub name: String,
    pub use_id: bool,
    pub version: String,
    pub update_interval_ms: u32,
    pub family: PlatformFamily,
    /// overrides the hardware address read from the host, e.g. "24:6F:28:AB:CD:EF"
    pub hardware_address: Option<String>,
}

impl Default for Prop {
    fn default() -> Self {
        Prop {
            room: "room".to_string(),
            name: "prop".to_string(),
            use_id: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
            update_interval_ms: 30_000,
            family: PlatformFamily::MultiCore,
            hardware_address: None,
        }
    }
}

impl Prop {
    /// parse the configured hardware address, separators ':' and '-' are ignored
    pub fn hardware_address(&self) -> Option<u64> {
        let raw = self.hardware_address.as_ref()?;
        let hex: String = raw.chars().filter(|c| *c != ':' && *c != '-').collect();
        u64::from_str_radix(hex.as_str(), 16).ok()
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Wifi {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for Wifi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wifi")
            .field("ssid", &self.ssid)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Mqtt {
    pub broker_host: String,
    pub broker_port: u16,
    pub keep_alive_secs: u16,
}

impl Default for Mqtt {
    fn default() -> Self {
        Mqtt {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1883,
            keep_alive_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Web {
    pub web_host: String,
    pub web_port: u16,
}

impl Default for Web {
    fn default() -> Self {
        Web {
            web_host: "0.0.0.0".to_string(),
            web_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub env: Env,
    pub prop: Prop,
    pub wifi: Wifi,
    pub mqtt: Mqtt,
    pub web: Web,
}

impl Settings {
    pub fn get<'a>() -> &'a Self {
        // 给静态变量延迟赋值的宏
        lazy_static! {
            static ref CACHE: Settings = Settings::load().unwrap_or_else(|e| {
                log::warn!("cannot load settings, use defaults: {e}");
                Settings::default()
            });
        }
        &CACHE
    }

    /// read config_{ENV}.toml from the working directory
    pub fn load() -> Result<Self, PropError> {
        let env = match env::var("ENV") {
            Ok(e) => e,
            Err(_) => {
                log::warn!("no ENV set, use default: 'dev'");
                String::from("dev")
            }
        };

        let file_path = format!("config_{}.toml", env);
        let str_val = fs::read_to_string(file_path.as_str()).map_err(|e| PropError {
            code: ErrorCode::ConfigError,
            msg: format!("cannot read config file {}: {}", file_path, e),
        })?;

        Self::from_toml_str(str_val.as_str())
    }

    pub fn from_toml_str(str_val: &str) -> Result<Self, PropError> {
        toml::from_str(str_val).map_err(|e| PropError {
            code: ErrorCode::ConfigError,
            msg: format!("config file format invalid: {e}"),
        })
    }
}
