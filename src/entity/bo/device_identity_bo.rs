//! identity of one prop, fixed at construction

use std::fmt::Write;

/// only the low 24 bits of the hardware address make up the unique id
pub const UNIQUE_ID_MASK: u64 = 0x00FF_FFFF;

/// 24 bits render to at most 6 hex digits
pub type UniqueId = heapless::String<8>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentityBo {
    room: String,
    name: String,
    use_id: bool,
    version: String,
    unique_id: UniqueId,
}

impl DeviceIdentityBo {
    pub fn new(room: &str, name: &str, use_id: bool, version: &str, hardware_address: u64) -> Self {
        DeviceIdentityBo {
            room: room.to_string(),
            name: name.to_string(),
            use_id,
            version: version.to_string(),
            unique_id: unique_id_from_address(hardware_address),
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn use_id(&self) -> bool {
        self.use_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn unique_id(&self) -> &str {
        self.unique_id.as_str()
    }
}

/// uppercase hex of the truncated address, without zero padding
pub fn unique_id_from_address(hardware_address: u64) -> UniqueId {
    let mut id = UniqueId::new();
    // cannot overflow: 6 digits into a capacity of 8
    let _ = write!(id, "{:X}", hardware_address & UNIQUE_ID_MASK);
    id
}
