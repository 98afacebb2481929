//! MQTT call bridge
//!
//! Remote callers publish `{request_id, channel, method}` on the call topic;
//! the bridge runs the method on the telephony channel and publishes the
//! outcome, tagged with the same `request_id`, on the result topic.

use crate::config::MqttConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use netprobe_core::{CallOutcome, TelephonyChannel, CHANNEL_NAME};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const CALL_TOPIC: &str = "netprobe/telephony/call@v1";
pub const RESULT_TOPIC: &str = "netprobe/telephony/result@v1";

/// Incoming call (matches telephony.call@v1)
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub request_id: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    pub method: String,
}

fn default_channel() -> String {
    CHANNEL_NAME.to_string()
}

/// Call result (matches telephony.result@v1)
#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub request_id: String,
    pub channel: String,
    #[serde(flatten)]
    pub outcome: CallOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Where results go; the broker client in production.
pub trait ResultPublisher: Clone + Send + Sync + 'static {
    fn publish_result(&self, payload: Vec<u8>) -> impl Future<Output = Result<()>> + Send;
}

impl ResultPublisher for AsyncClient {
    async fn publish_result(&self, payload: Vec<u8>) -> Result<()> {
        self.publish(RESULT_TOPIC, QoS::AtLeastOnce, false, payload)
            .await
            .context("Failed to publish call result")
    }
}

/// Answers raw call payloads with the telephony channel.
#[derive(Clone)]
pub struct CallBridge {
    channel: Arc<TelephonyChannel>,
}

impl CallBridge {
    pub fn new(channel: TelephonyChannel) -> Self {
        Self {
            channel: Arc::new(channel),
        }
    }

    /// Decode, dispatch and build the response. `None` for undecodable calls,
    /// which carry no request id to answer to.
    pub fn respond(&self, payload: &[u8]) -> Option<CallResponse> {
        let request: CallRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!("Dropping malformed call: {}", e);
                return None;
            }
        };

        debug!("Call {} -> {}.{}", request.request_id, request.channel, request.method);
        let outcome = if request.channel == self.channel.name() {
            self.channel.handle(&request.method)
        } else {
            warn!("Call {} for unknown channel {}", request.request_id, request.channel);
            CallOutcome::NotImplemented
        };

        Some(CallResponse {
            request_id: request.request_id,
            channel: request.channel,
            outcome,
            timestamp: Utc::now(),
        })
    }

    /// Answer one call and publish the result. Snapshot building blocks, so
    /// it runs on the blocking pool.
    pub async fn answer<P: ResultPublisher>(&self, publisher: &P, payload: Vec<u8>) -> Result<()> {
        let bridge = self.clone();
        let response = tokio::task::spawn_blocking(move || bridge.respond(&payload))
            .await
            .context("Call handler panicked")?;

        let Some(response) = response else {
            return Ok(());
        };

        let body = serde_json::to_vec(&response).context("Failed to serialize call result")?;
        publisher.publish_result(body).await?;
        info!("Answered call {} ({})", response.request_id, outcome_label(&response.outcome));
        Ok(())
    }
}

fn outcome_label(outcome: &CallOutcome) -> &'static str {
    match outcome {
        CallOutcome::Success { .. } => "success",
        CallOutcome::Error { .. } => "error",
        CallOutcome::NotImplemented => "not implemented",
    }
}

/// Connect to the broker and answer calls until interrupted.
pub async fn serve(config: &MqttConfig, bridge: CallBridge) -> Result<()> {
    let client_id = config
        .client_id
        .clone()
        .unwrap_or_else(|| format!("netprobe-agent-{}", uuid::Uuid::new_v4()));

    let mut mqtt_options = MqttOptions::new(&client_id, &config.broker_host, config.broker_port);
    mqtt_options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 10);
    client
        .subscribe(CALL_TOPIC, QoS::AtLeastOnce)
        .await
        .context("Failed to subscribe to call topic")?;
    info!(
        "Serving {} on {}:{} ({})",
        CHANNEL_NAME, config.broker_host, config.broker_port, CALL_TOPIC
    );

    // One listener for the whole loop so a signal during back-off is kept
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Incoming::Publish(publish))) if publish.topic == CALL_TOPIC => {
                    let bridge = bridge.clone();
                    let client = client.clone();
                    let payload = publish.payload.to_vec();
                    // Answer off the event loop so publishing cannot stall polling
                    tokio::spawn(async move {
                        if let Err(e) = bridge.answer(&client, payload).await {
                            error!("Failed to answer call: {:#}", e);
                        }
                    });
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    // Clean sessions drop subscriptions on reconnect
                    if let Err(e) = client.subscribe(CALL_TOPIC, QoS::AtLeastOnce).await {
                        error!("Failed to resubscribe: {}", e);
                    }
                    info!("Connected to MQTT broker");
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT connection error: {}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            },
            _ = &mut ctrl_c => {
                info!("Interrupted, disconnecting");
                if let Err(e) = client.disconnect().await {
                    debug!("Disconnect failed: {}", e);
                }
                return Ok(());
            }
        }
    }
}
