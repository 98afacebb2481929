//! Agent configuration
//!
//! Handles:
//! - Platform level and radio source selection
//! - Identity store and installation id locations
//! - MQTT broker settings
//! - Collector endpoint

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Timestamp locale such as `fr_FR`; the environment locale when unset.
    pub locale: Option<String>,
    pub platform: PlatformConfig,
    pub radio: RadioConfig,
    pub identity: IdentityConfig,
    pub mqtt: MqttConfig,
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioSourceKind {
    ModemManager,
    StateFile,
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub source: RadioSourceKind,
    pub state_file: Option<PathBuf>,
    pub modem_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub wifi_interface: String,
    pub store_path: Option<PathBuf>,
    pub installation_id_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: Option<String>,
    pub keep_alive_secs: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            level: netprobe_core::PlatformLevel::CURRENT.0,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            source: RadioSourceKind::ModemManager,
            state_file: None,
            modem_id: None,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            wifi_interface: netprobe_core::identity::DEFAULT_WIFI_INTERFACE.to_string(),
            store_path: None,
            installation_id_path: None,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1883,
            client_id: None,
            keep_alive_secs: 30,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AgentConfig {
    /// Load from `path`, or from the OS-specific location when `None`
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file_path()?,
        };
        Self::load_from(&config_path).await
    }

    /// Missing file means defaults
    pub async fn load_from(config_path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(config_path).await.unwrap_or(false) {
            debug!("No config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(config_path)
            .await
            .with_context(|| format!("Failed to read config {:?}", config_path))?;
        let config: AgentConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config {:?}", config_path))?;
        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub async fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(config_path, content).await?;
        Ok(())
    }

    /// OS-specific config file path
    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("netprobe");
        path.push("config.toml");
        Ok(path)
    }

    /// Identity store location, defaulting to the OS data directory
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.identity.store_path {
            return Ok(path.clone());
        }
        let mut path = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        path.push("netprobe");
        path.push("identity.json");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.platform.level, 34);
        assert_eq!(config.radio.source, RadioSourceKind::ModemManager);
        assert_eq!(config.identity.wifi_interface, "wlan0");
    }

    #[test]
    fn test_config_file_path() {
        let path = AgentConfig::config_file_path().unwrap();
        assert!(path.to_string_lossy().contains("netprobe"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            "locale = \"fr_FR\"\n\n[radio]\nsource = \"state_file\"\nstate_file = \"/run/netprobe/radio.json\"\n",
        )
        .await
        .unwrap();

        let config = AgentConfig::load(Some(&path)).await.unwrap();
        assert_eq!(config.locale.as_deref(), Some("fr_FR"));
        assert_eq!(config.radio.source, RadioSourceKind::StateFile);
        assert_eq!(config.platform.level, 34);
        assert_eq!(config.collector.timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AgentConfig::default();
        config.platform.level = 22;
        config.mqtt.client_id = Some("probe-1".into());
        config.save_to(&path).await.unwrap();

        let loaded = AgentConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded.platform.level, 22);
        assert_eq!(loaded.mqtt.client_id.as_deref(), Some("probe-1"));
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::load_from(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config.collector.base_url, "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[platform]\nlevel = \"high\"\n").await.unwrap();
        assert!(AgentConfig::load_from(&path).await.is_err());
    }
}
