//! NetProbe Agent - radio telemetry snapshots for remote callers
//!
//! This agent exposes the host's telemetry snapshot:
//! - One-shot snapshot or device identifier on stdout
//! - Upload to a collector, once or periodically
//! - `telephony_channel` method calls over MQTT
//! - Writing a starter configuration file

mod bridge;
mod config;
mod platform;
mod upload;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::AgentConfig;
use netprobe_core::{SnapshotBuilder, TelemetryFields, TelephonyChannel};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netprobe-agent", version, about = "Radio telemetry snapshots and stable device identity")]
struct Cli {
    /// Config file (default: <config dir>/netprobe/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one flattened snapshot as JSON
    Snapshot {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Print the device identifier
    Identity,
    /// Send snapshots to the collector
    Upload {
        /// Keep uploading every N seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
    },
    /// Answer telephony calls over MQTT
    Serve,
    /// Write the effective configuration to the config file
    InitConfig,
}

/// Build one snapshot on the blocking pool and flatten it
async fn take_snapshot(builder: Arc<SnapshotBuilder>) -> Result<TelemetryFields> {
    tokio::task::spawn_blocking(move || builder.build_fields())
        .await
        .context("Snapshot task panicked")?
        .context("Failed to build snapshot")
}

async fn upload_loop(builder: Arc<SnapshotBuilder>, config: &AgentConfig, every: Option<u64>) -> Result<()> {
    let uploader = upload::Uploader::new(&config.collector)?;

    let Some(secs) = every else {
        let fields = take_snapshot(builder).await?;
        let ack = uploader.upload(&fields).await?;
        println!("{}", ack.message);
        return Ok(());
    };

    upload_every(builder, &uploader, secs, tokio::signal::ctrl_c()).await;
    Ok(())
}

/// Upload every `secs` seconds until `shutdown` completes. A shutdown that
/// fires mid-upload stops the loop once that upload returns.
async fn upload_every<F: Future>(builder: Arc<SnapshotBuilder>, uploader: &upload::Uploader, secs: u64, shutdown: F) {
    info!("Uploading to {} every {}s", uploader.endpoint(), secs);
    let mut timer = tokio::time::interval(Duration::from_secs(secs.max(1)));
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = timer.tick() => {
                let result = match take_snapshot(builder.clone()).await {
                    Ok(fields) => uploader.upload(&fields).await.map(|_| ()),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    error!("Upload failed: {:#}", e);
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, stopping uploads");
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("netprobe_core=info,netprobe_agent=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    if let Command::InitConfig = cli.command {
        let path = match cli.config {
            Some(path) => path,
            None => AgentConfig::config_file_path()?,
        };
        config.save_to(&path).await.context("Failed to write configuration")?;
        println!("{}", path.display());
        return Ok(());
    }

    let builder = platform::snapshot_builder(&config).context("Failed to set up snapshot sources")?;

    match cli.command {
        Command::Snapshot { pretty } => {
            let fields = take_snapshot(Arc::new(builder)).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&fields)?
            } else {
                serde_json::to_string(&fields)?
            };
            println!("{}", json);
        }
        Command::Identity => {
            let builder = Arc::new(builder);
            let identifier = tokio::task::spawn_blocking(move || builder.identity().resolve())
                .await
                .context("Identity task panicked")?
                .context("Failed to resolve device identifier")?;
            println!("{}", identifier);
        }
        Command::Upload { every } => {
            upload_loop(Arc::new(builder), &config, every).await?;
        }
        Command::Serve => {
            let bridge = bridge::CallBridge::new(TelephonyChannel::new(builder));
            bridge::serve(&config.mqtt, bridge).await.context("MQTT bridge failed")?;
        }
        // Written before the sources are set up
        Command::InitConfig => {}
    }

    Ok(())
}
