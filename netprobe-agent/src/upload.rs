//! Collector upload
//!
//! POSTs flattened snapshots as JSON to the collector's `/data` endpoint.

use crate::config::CollectorConfig;
use anyhow::{Context, Result};
use netprobe_core::TelemetryFields;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Collector acknowledgement
#[derive(Debug, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
}

pub struct Uploader {
    client: reqwest::Client,
    endpoint: String,
}

impl Uploader {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("netprobe-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: data_endpoint(&config.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn upload(&self, fields: &TelemetryFields) -> Result<UploadAck> {
        debug!("Uploading snapshot to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(fields)
            .send()
            .await
            .with_context(|| format!("Failed to reach collector at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Collector rejected snapshot: {}", status));
        }

        // Older collectors answer with an empty body
        let body = response.text().await.context("Failed to read collector response")?;
        let ack = if body.trim().is_empty() {
            UploadAck { message: String::new() }
        } else {
            serde_json::from_str(&body).context("Invalid collector response")?
        };
        info!("Snapshot uploaded ({})", status);
        Ok(ack)
    }
}

/// `<base>/data`, tolerating a trailing slash on the base URL
pub fn data_endpoint(base_url: &str) -> String {
    format!("{}/data", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_endpoint() {
        assert_eq!(data_endpoint("http://collector:8000"), "http://collector:8000/data");
        assert_eq!(data_endpoint("http://collector:8000/"), "http://collector:8000/data");
        assert_eq!(data_endpoint("https://host/api"), "https://host/api/data");
    }

    #[test]
    fn test_uploader_uses_config() {
        let config = CollectorConfig {
            base_url: "http://10.0.0.1:8000/".into(),
            timeout_secs: 3,
        };
        let uploader = Uploader::new(&config).unwrap();
        assert_eq!(uploader.endpoint(), "http://10.0.0.1:8000/data");
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_an_error() {
        let config = CollectorConfig {
            // Port 9 (discard) on loopback refuses connections on test hosts
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
        };
        let fields: TelemetryFields = serde_json::from_value(serde_json::json!({
            "operator": "", "signalPower": "N/A", "sinr": "N/A", "networkType": "Unknown",
            "frequencyBand": "", "cellId": "", "macAddress": "", "ipAddress": "",
            "timeStamp": "07 Mar 2024 03:04 PM"
        }))
        .unwrap();

        let err = Uploader::new(&config).unwrap().upload(&fields).await.unwrap_err();
        assert!(err.to_string().contains("Failed to reach collector"));
    }
}
