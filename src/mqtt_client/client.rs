//! message bus supervision
//! - handshake with last will, online announcement and (re)subscription
//! - fixed backoff retry, restart after CONNECT_RETRY_LIMIT consecutive failures
//! - best-effort publish, nothing is queued while disconnected

use super::protocol::{bounded_topic, Topic, TopicSet, DERIVED_TOPIC_COUNT, MAX_TOPICS};
use crate::common::error::{ErrorCode, PropError};
use crate::driver::traits::bus::{BusClient, LastWill};
use crate::driver::traits::platform::{Platform, RestartReason};
use crate::entity::dto::inbound_message_dto::InboundMessageDto;
use crate::{debug, error, info, warn};

const LOG_TAG: &str = "mqtt_client";

pub const CONNECT_RETRY_LIMIT: u32 = 10;
pub const CONNECT_BACKOFF_MS: u32 = 1_000;
pub const DEFAULT_KEEP_ALIVE_SECS: u16 = 30;
pub const ONLINE_PAYLOAD: &str = "Online";
pub const OFFLINE_PAYLOAD: &str = "Offline";
pub const MAX_APP_TOPICS: usize = MAX_TOPICS - DERIVED_TOPIC_COUNT;

pub struct BusSupervisor {
    client: Box<dyn BusClient + Send>,
    client_id: String,
    keep_alive_secs: u16,
    // consecutive failed handshakes, zeroed by a successful one
    failed_attempts: u32,
    connect_count: u32,
    // application topics, resubscribed after every handshake
    app_topics: heapless::Vec<Topic, MAX_APP_TOPICS>,
}

impl BusSupervisor {
    pub fn new(mut client: Box<dyn BusClient + Send>, client_id: &str, keep_alive_secs: u16) -> Self {
        client.set_keep_alive(keep_alive_secs);
        BusSupervisor {
            client,
            client_id: client_id.to_string(),
            keep_alive_secs,
            failed_attempts: 0,
            connect_count: 0,
            app_topics: heapless::Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// successful handshakes since construction
    pub fn connect_count(&self) -> u32 {
        self.connect_count
    }

    /// applies to the next handshake
    pub fn set_keep_alive(&mut self, secs: u16) {
        self.keep_alive_secs = secs;
        self.client.set_keep_alive(secs);
    }

    pub fn app_topics(&self) -> &[Topic] {
        &self.app_topics
    }

    /// loop until connected; the device is restarted after CONNECT_RETRY_LIMIT
    /// consecutive failures and a FatalRestart error is returned
    pub fn connect(&mut self, topics: &TopicSet, platform: &mut dyn Platform) -> Result<(), PropError> {
        while !self.client.is_connected() {
            info!(LOG_TAG, "attempting mqtt connection, client id: {}", self.client_id);
            let last_will = LastWill {
                topic: topics.last_will(),
                payload: OFFLINE_PAYLOAD,
                retain: true,
            };

            let outcome = match self.client.connect(self.client_id.as_str(), &last_will) {
                // a session taken over right after the handshake counts as a failure
                Ok(()) if !self.client.is_connected() => Err(PropError::new(
                    ErrorCode::MqttError,
                    "session dropped right after the handshake",
                )),
                other => other,
            };

            match outcome {
                Ok(()) => {
                    self.failed_attempts = 0;
                    self.connect_count += 1;
                    info!(LOG_TAG, "mqtt connected");
                    self.publish(topics.last_will(), ONLINE_PAYLOAD.as_bytes(), true);
                    self.subscribe_topics(topics);
                }
                Err(e) => {
                    self.failed_attempts += 1;
                    warn!(
                        LOG_TAG,
                        "mqtt connect failed, attempt {}/{}, err: {}",
                        self.failed_attempts,
                        CONNECT_RETRY_LIMIT,
                        e
                    );
                    if self.failed_attempts >= CONNECT_RETRY_LIMIT {
                        error!(LOG_TAG, "mqtt unreachable, restarting device");
                        platform.restart(RestartReason::BusRetriesExhausted);
                        return Err(PropError::new(
                            ErrorCode::FatalRestart,
                            "mqtt connect retries exhausted",
                        ));
                    }
                    platform.delay(CONNECT_BACKOFF_MS);
                }
            }
        }
        Ok(())
    }

    /// once per tick while the link is up
    pub fn check_health(&mut self, topics: &TopicSet, platform: &mut dyn Platform) -> Result<(), PropError> {
        if self.client.is_connected() {
            return Ok(());
        }
        warn!(LOG_TAG, "mqtt connection lost, reconnecting");
        self.client.set_keep_alive(self.keep_alive_secs);
        self.connect(topics, platform)
    }

    /// best effort, a failed publish is logged and dropped
    pub fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) {
        match self.client.publish(topic, payload, retain) {
            Ok(()) => debug!(
                LOG_TAG,
                "published to {}: {}",
                topic,
                String::from_utf8_lossy(payload)
            ),
            Err(e) => warn!(LOG_TAG, "publish to {} dropped, err: {}", topic, e),
        }
    }

    /// add an application topic; it is subscribed now when connected and
    /// again after every reconnect
    pub fn subscribe(&mut self, topic: &str) -> Result<(), PropError> {
        let topic = bounded_topic(topic);
        if !self.app_topics.contains(&topic) {
            self.app_topics.push(topic.clone()).map_err(|_| PropError {
                code: ErrorCode::MqttError,
                msg: format!("topic table full, cannot subscribe: {}", topic),
            })?;
        }
        if self.client.is_connected() {
            self.client.subscribe(topic.as_str())?;
            info!(LOG_TAG, "subscribed to: {}", topic);
        }
        Ok(())
    }

    pub fn pump(&mut self) -> Vec<InboundMessageDto> {
        self.client.pump()
    }

    pub fn disconnect(&mut self) {
        info!(LOG_TAG, "mqtt disconnecting");
        self.client.disconnect();
    }

    fn subscribe_topics(&mut self, topics: &TopicSet) {
        let all = topics.subscribe_topics().iter().chain(self.app_topics.iter());
        for topic in all {
            match self.client.subscribe(topic.as_str()) {
                Ok(()) => info!(LOG_TAG, "subscribed to: {}", topic),
                Err(e) => warn!(LOG_TAG, "subscribe to {} failed, err: {}", topic, e),
            }
        }
    }
}
