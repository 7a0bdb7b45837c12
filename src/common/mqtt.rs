//! MQTT 服务连接器
//! paho 客户端在每次握手时重新创建，收到的消息经 mpsc 通道交给 supervisory loop

use std::sync::mpsc;
use std::time::Duration;

use paho_mqtt;

use super::error::{ErrorCode, PropError};
use crate::driver::traits::bus::{BusClient, LastWill};
use crate::entity::dto::inbound_message_dto::InboundMessageDto;
use crate::{debug, error, trace, warn};

const LOG_TAG: &str = "mqtt";

/// every message of the prop is sent at most once
const QOS: i32 = 0;

pub struct MqttConnection {
    /// 远程服务器地址
    host: String,

    /// 端口
    port: u16,

    keep_alive_secs: u16,

    /// 连接客户端对象
    client: Option<paho_mqtt::AsyncClient>,

    // message callback 持有发送端
    inbound_tx: mpsc::Sender<InboundMessageDto>,
    inbound_rx: mpsc::Receiver<InboundMessageDto>,
}

impl MqttConnection {
    pub fn new(host: &str, port: u16) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        MqttConnection {
            host: host.to_string(),
            port,
            keep_alive_secs: 30,
            client: None,
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn server_uri(&self) -> String {
        format!("tcp://{}:{}", self.host.as_str(), self.port)
    }

    fn connected_client(&self) -> Result<&paho_mqtt::AsyncClient, PropError> {
        match &self.client {
            Some(client) if client.is_connected() => Ok(client),
            _ => Err(PropError {
                code: ErrorCode::MqttError,
                msg: "no mqtt connection".to_string(),
            }),
        }
    }
}

fn mqtt_error(action: &str, e: paho_mqtt::Error) -> PropError {
    PropError {
        code: ErrorCode::MqttError,
        msg: format!("mqtt {} failed: {}", action, e),
    }
}

impl BusClient for MqttConnection {
    fn connect(&mut self, client_id: &str, last_will: &LastWill) -> Result<(), PropError> {
        let create_opts = paho_mqtt::CreateOptionsBuilder::new()
            .server_uri(self.server_uri())
            .client_id(client_id)
            .finalize();

        let client = paho_mqtt::AsyncClient::new(create_opts).map_err(|e| mqtt_error("create client", e))?;

        let will = if last_will.retain {
            paho_mqtt::Message::new_retained(last_will.topic, last_will.payload, QOS)
        } else {
            paho_mqtt::Message::new(last_will.topic, last_will.payload, QOS)
        };

        let conn_opts = paho_mqtt::ConnectOptionsBuilder::new()
            .keep_alive_interval(Duration::from_secs(self.keep_alive_secs as u64))
            .clean_session(true)
            .will_message(will)
            .finalize();

        client.set_connection_lost_callback(|_cli| {
            error!(LOG_TAG, "*** mqtt Connection lost ***");
        });

        let tx = self.inbound_tx.clone();
        client.set_message_callback(move |_cli, msg| {
            if let Some(msg) = msg {
                trace!(LOG_TAG, "received message! topic: {}", msg.topic());
                if tx.send(InboundMessageDto::new(msg.topic(), msg.payload())).is_err() {
                    warn!(LOG_TAG, "inbound channel closed, message dropped");
                }
            }
        });

        if let Err(e) = client.connect(conn_opts).wait() {
            error!(LOG_TAG, "cannot connect to mqtt server {}: {:?}", self.server_uri(), e);
            return Err(mqtt_error("connect", e));
        }

        self.client = Some(client);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().map(|c| c.is_connected()).unwrap_or(false)
    }

    fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.disconnect(None).wait() {
                warn!(LOG_TAG, "mqtt disconnect failed: {}", e);
            }
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), PropError> {
        let client = self.connected_client()?;
        let msg = if retain {
            paho_mqtt::Message::new_retained(topic, payload, QOS)
        } else {
            paho_mqtt::Message::new(topic, payload, QOS)
        };
        client.publish(msg).wait().map_err(|e| mqtt_error("publish", e))?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), PropError> {
        let client = self.connected_client()?;
        client.subscribe(topic, QOS).wait().map_err(|e| mqtt_error("subscribe", e))?;
        debug!(LOG_TAG, "mqtt subscribed: {}", topic);
        Ok(())
    }

    fn set_keep_alive(&mut self, secs: u16) {
        self.keep_alive_secs = secs;
    }

    fn pump(&mut self) -> Vec<InboundMessageDto> {
        self.inbound_rx.try_iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unconnected_client_rejects_traffic() {
        let mut mqtt = MqttConnection::new("127.0.0.1", 1883);
        assert_eq!(mqtt.server_uri(), "tcp://127.0.0.1:1883");
        assert!(!mqtt.is_connected());

        let err = mqtt.publish("/stat/Lock1", b"{}", true).unwrap_err();
        assert_eq!(err.code, ErrorCode::MqttError);
        assert!(mqtt.subscribe("/cmnd/Lock1").is_err());
        assert!(mqtt.pump().is_empty());
        mqtt.disconnect();
    }

    #[test]
    fn test_pump_drains_callback_channel() {
        let mut mqtt = MqttConnection::new("127.0.0.1", 1883);
        mqtt.set_keep_alive(60);
        assert_eq!(mqtt.keep_alive_secs, 60);

        let tx = mqtt.inbound_tx.clone();
        tx.send(InboundMessageDto::new("eeprop", b"reset")).unwrap();
        tx.send(InboundMessageDto::new("/cmnd/Lock1", b"open")).unwrap();

        let received = mqtt.pump();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].topic, "/cmnd/Lock1");
        assert!(mqtt.pump().is_empty());
    }
}
