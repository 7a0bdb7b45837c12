use std::fmt;
use std::net::IpAddr;

/// credentials of the access point the prop joins
#[derive(Clone, Default)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Self {
        Credentials {
            ssid: ssid.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"***")
            .finish()
    }
}

/// radio link of the device
/// attachment is only observed by polling `is_attached`, never pushed
pub trait Network {
    fn set_hostname(&mut self, hostname: &str);

    /// start joining the network, returns without waiting for the join
    fn begin(&mut self, credentials: &Credentials);

    fn is_attached(&self) -> bool;

    /// drop the current association and join again
    fn reattach(&mut self);

    /// leave the network and switch the radio off
    fn detach(&mut self);

    fn set_transmit_power(&mut self, dbm: i8);

    /// None when the platform cannot report it
    fn transmit_power(&self) -> Option<i8>;

    fn local_address(&self) -> Option<IpAddr>;

    /// received signal strength in dBm
    fn signal_strength(&self) -> i32;

    fn network_name(&self) -> String;
}
