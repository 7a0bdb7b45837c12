//! records published by the prop, serialized as compact json

use serde::Serialize;
use serde_json::{Map, Value};

use crate::common::error::{ErrorCode, PropError};

/// keys of the status record an application hook must not override
pub const RESERVED_STATUS_KEYS: [&str; 2] = ["sys", "TxPower"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SysStateDto {
    pub uptime: u64,
    pub enabled: bool,
    pub active: bool,
    pub solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core: Option<u32>,
}

/// periodic and post-command status record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDto {
    pub sys: SysStateDto,
    #[serde(rename = "TxPower", skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<i8>,
    // fields added by the application hook
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppCoreDto {
    pub core: u32,
}

/// telemetry sent once after the first bus connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootDto {
    pub name: String,
    pub version: String,
    pub rssi: i32,
    #[serde(rename = "TxPower", skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<i8>,
    pub ssid: String,
    pub ipaddr: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppCoreDto>,
}

impl StatusDto {
    pub fn to_json(&self) -> Result<String, PropError> {
        to_json(self)
    }
}

impl BootDto {
    pub fn to_json(&self) -> Result<String, PropError> {
        to_json(self)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, PropError> {
    serde_json::to_string(value).map_err(|e| PropError {
        code: ErrorCode::MqttError,
        msg: format!("cannot serialize record to json: {e}"),
    })
}
