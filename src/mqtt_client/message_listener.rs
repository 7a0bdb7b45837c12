//! get message from mqtt client, then dispatch it:
//! the reserved reboot command is reported back to the prop, everything else
//! goes unchanged to the application handler

use crate::entity::dto::inbound_message_dto::InboundMessageDto;
use crate::{debug, info};

const LOG_TAG: &str = "message_listener";

/// matched as a 6 byte prefix, "rebooted" restarts the device as well
pub const REBOOT_COMMAND: &[u8] = b"reboot";

/// application callback receiving (topic, payload)
pub type MessageHandler = Box<dyn FnMut(&str, &[u8]) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Reboot,
    Forwarded,
    // no application handler registered
    Dropped,
}

pub fn is_reboot_command(payload: &[u8]) -> bool {
    payload.starts_with(REBOOT_COMMAND)
}

#[derive(Default)]
pub struct CommandDispatcher {
    handler: Option<MessageHandler>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        CommandDispatcher { handler: None }
    }

    /// replaces a previously registered handler
    pub fn set_handler(&mut self, handler: MessageHandler) {
        self.handler = Some(handler);
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn on_message(&mut self, msg: &InboundMessageDto) -> Dispatch {
        debug!(LOG_TAG, "message arrived [{}] {}", msg.topic, msg.payload_str());

        if is_reboot_command(&msg.payload) {
            info!(LOG_TAG, "reboot command on {}", msg.topic);
            return Dispatch::Reboot;
        }

        match self.handler.as_mut() {
            Some(handler) => {
                handler(msg.topic.as_str(), msg.payload.as_slice());
                Dispatch::Forwarded
            }
            None => Dispatch::Dropped,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_reboot_prefix_match() {
        assert!(is_reboot_command(b"reboot"));
        assert!(is_reboot_command(b"rebooted"));
        assert!(is_reboot_command(b"reboot-later"));
        assert!(!is_reboot_command(b"reboo"));
        assert!(!is_reboot_command(b"Reboot"));
        assert!(!is_reboot_command(b" reboot"));
        assert!(!is_reboot_command(b""));
    }

    #[test]
    fn test_reboot_never_reaches_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.set_handler(Box::new(move |topic, payload| {
            sink.lock().unwrap().push((topic.to_string(), payload.to_vec()));
        }));

        let reboot = InboundMessageDto::new("/cmnd/Lock1", b"reboot");
        assert_eq!(dispatcher.on_message(&reboot), Dispatch::Reboot);
        assert!(seen.lock().unwrap().is_empty());

        let open = InboundMessageDto::new("/cmnd/Lock1", b"open\x00\xff");
        assert_eq!(dispatcher.on_message(&open), Dispatch::Forwarded);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("/cmnd/Lock1".to_string(), b"open\x00\xff".to_vec())]
        );
    }

    #[test]
    fn test_without_handler() {
        let mut dispatcher = CommandDispatcher::default();
        assert!(!dispatcher.has_handler());
        let msg = InboundMessageDto::new("eeprop", b"reset");
        assert_eq!(dispatcher.on_message(&msg), Dispatch::Dropped);
    }
}
