//! topic names of a prop, derived once from its identity
//!
//! subscribe set, in this order:
//! - `eeprop`               broadcast to every prop
//! - `{room}`               broadcast to the room
//! - `/cmnd/{name}`         commands for every prop with this name
//! - `/cmnd/{name}/{id}`    commands for exactly this prop
//!
//! private topics `/lwt/{name}`, `/stat/{name}`, `/tele/{name}` carry the
//! `/{id}` suffix when the identity asks for it.

use crate::entity::bo::device_identity_bo::DeviceIdentityBo;

/// fixed topic buffer size, no topic is ever longer
pub const TOPIC_CAPACITY: usize = 32;

/// derived and application topics together
pub const MAX_TOPICS: usize = 10;

pub const DERIVED_TOPIC_COUNT: usize = 4;

pub const BROADCAST_TOPIC: &str = "eeprop";

const COMMAND_PREFIX: &str = "/cmnd/";
const LAST_WILL_PREFIX: &str = "/lwt/";
const STATUS_PREFIX: &str = "/stat/";
const TELEMETRY_PREFIX: &str = "/tele/";

pub type Topic = heapless::String<TOPIC_CAPACITY>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    subscribe: [Topic; DERIVED_TOPIC_COUNT],
    last_will: Topic,
    status: Topic,
    telemetry: Topic,
}

impl TopicSet {
    pub fn derive(identity: &DeviceIdentityBo) -> Self {
        let id = identity.unique_id();
        // the longest topic is /cmnd/{name}/{id}, the name gives way so the id survives
        let name_budget = TOPIC_CAPACITY.saturating_sub(COMMAND_PREFIX.len() + 1 + id.len());
        let name = truncate_str(identity.name(), name_budget);
        let id_suffix: Option<&str> = if identity.use_id() { Some(id) } else { None };

        TopicSet {
            subscribe: [
                make_topic_str(&[BROADCAST_TOPIC]),
                make_topic_str(&[identity.room()]),
                make_topic_str(&[COMMAND_PREFIX, name]),
                make_topic_str(&[COMMAND_PREFIX, name, "/", id]),
            ],
            last_will: private_topic(LAST_WILL_PREFIX, name, id_suffix),
            status: private_topic(STATUS_PREFIX, name, id_suffix),
            telemetry: private_topic(TELEMETRY_PREFIX, name, id_suffix),
        }
    }

    pub fn subscribe_topics(&self) -> &[Topic] {
        &self.subscribe
    }

    pub fn last_will(&self) -> &str {
        self.last_will.as_str()
    }

    pub fn status(&self) -> &str {
        self.status.as_str()
    }

    pub fn telemetry(&self) -> &str {
        self.telemetry.as_str()
    }
}

/// an arbitrary topic cut down to the topic buffer
pub fn bounded_topic(topic: &str) -> Topic {
    make_topic_str(&[topic])
}

fn private_topic(prefix: &str, name: &str, id: Option<&str>) -> Topic {
    match id {
        Some(id) => make_topic_str(&[prefix, name, "/", id]),
        None => make_topic_str(&[prefix, name]),
    }
}

/// 拼接 topic 字符串，超出容量的部分被丢弃
fn make_topic_str(parts: &[&str]) -> Topic {
    let mut topic = Topic::new();
    for part in parts {
        for c in part.chars() {
            if topic.push(c).is_err() {
                return topic;
            }
        }
    }
    topic
}

/// longest prefix of `s` within `max_bytes` that ends on a char boundary
fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
