use crate::common::error::PropError;
use crate::entity::dto::inbound_message_dto::InboundMessageDto;

/// last-will message the broker holds for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastWill<'a> {
    pub topic: &'a str,
    pub payload: &'a str,
    pub retain: bool,
}

/// publish/subscribe client of the broker
pub trait BusClient {
    /// one handshake attempt, the last will is presented with it
    fn connect(&mut self, client_id: &str, last_will: &LastWill) -> Result<(), PropError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self);

    /// fails at transport level when not connected, nothing is queued
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), PropError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), PropError>;

    /// applies to the next handshake
    fn set_keep_alive(&mut self, secs: u16);

    /// hand over everything received since the last pump, never blocks
    fn pump(&mut self) -> Vec<InboundMessageDto>;
}
