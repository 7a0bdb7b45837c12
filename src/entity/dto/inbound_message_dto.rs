/// one message delivered by the broker on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessageDto {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessageDto {
    pub fn new(topic: &str, payload: &[u8]) -> Self {
        InboundMessageDto {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        }
    }

    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).to_string()
    }
}
