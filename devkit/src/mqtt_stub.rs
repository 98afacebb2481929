/*!
Mock MQTT client for tests without a broker

Records every publication and lets tests inject incoming messages.
*/

use anyhow::Result;
use netprobe_core::dispatch::{CHANNEL_NAME, GET_TELEPHONY_INFO};
use rumqttc::QoS;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Stand-in for `rumqttc::AsyncClient`
#[derive(Clone, Default)]
pub struct MockMqttClient {
    published_messages: Arc<Mutex<Vec<MockMessage>>>,
    message_sender: Arc<Mutex<Option<mpsc::UnboundedSender<MockMessage>>>>,
}

impl MockMqttClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel receiving the messages injected with `simulate_incoming`
    pub fn setup_receiver(&self) -> mpsc::UnboundedReceiver<MockMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.message_sender.lock().unwrap() = Some(sender);
        receiver
    }

    pub async fn publish<S, V>(&self, topic: S, qos: QoS, retain: bool, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain,
        };
        log::debug!("[mock] published to {}: {} bytes", message.topic, message.payload.len());
        self.published_messages.lock().unwrap().push(message);
        Ok(())
    }

    pub async fn simulate_incoming<S, V>(&self, topic: S, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtLeastOnce,
            retain: false,
        };

        if let Some(sender) = self.message_sender.lock().unwrap().as_ref() {
            sender
                .send(message)
                .map_err(|e| anyhow::anyhow!("Send error: {}", e))?;
        }
        Ok(())
    }

    pub fn get_published_messages(&self) -> Vec<MockMessage> {
        self.published_messages.lock().unwrap().clone()
    }

    pub fn find_messages_by_topic(&self, topic: &str) -> Vec<MockMessage> {
        self.published_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|msg| msg.topic == topic)
            .cloned()
            .collect()
    }

    /// Last message on `topic`, parsed as JSON
    pub fn get_last_json_message<T>(&self, topic: &str) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.find_messages_by_topic(topic).last() {
            Some(last_msg) => Ok(Some(serde_json::from_slice(&last_msg.payload)?)),
            None => Ok(None),
        }
    }
}

/// Call payloads as a remote caller would send them
pub struct CallBuilder;

impl CallBuilder {
    pub fn call<S: Into<String>>(request_id: S, channel: &str, method: &str) -> Value {
        serde_json::json!({
            "request_id": request_id.into(),
            "channel": channel,
            "method": method,
        })
    }

    pub fn get_telephony_info<S: Into<String>>(request_id: S) -> Value {
        Self::call(request_id, CHANNEL_NAME, GET_TELEPHONY_INFO)
    }
}
