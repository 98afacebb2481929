//! Radio state written to disk by an external platform bridge

use super::{RadioInfoSource, RadioState};
use crate::error::TelemetryError;
use std::path::PathBuf;
use tracing::debug;

/// Reads a JSON `RadioState` document on every query.
#[derive(Debug, Clone)]
pub struct StateFileSource {
    path: PathBuf,
}

impl StateFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl RadioInfoSource for StateFileSource {
    fn query(&self) -> Result<RadioState, TelemetryError> {
        debug!("Reading radio state from {:?}", self.path);
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                TelemetryError::SourceUnavailable(format!("{} does not exist", self.path.display()))
            }
            _ => TelemetryError::query("reading radio state", e),
        })?;
        serde_json::from_str(&content).map_err(|e| TelemetryError::MalformedInput(e.to_string()))
    }
}
