//! JSON configuration file adapter.
//!
//! Implements [`ConfigPort`] by reading a JSON document from the data
//! partition (`/spiffs/config.json` on the device).  Missing keys take
//! their placeholder defaults; every loaded value is validated before it
//! is handed out.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::MonitorConfig;

/// Largest config document accepted.
const MAX_CONFIG_BYTES: u64 = 4096;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<MonitorConfig, ConfigError> {
        let meta = std::fs::metadata(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        if meta.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Corrupted);
        }

        let bytes = std::fs::read(&self.path).map_err(|_| ConfigError::IoError)?;
        let config: MonitorConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        info!("Config: read {} bytes from {}", bytes.len(), self.path.display());
        Ok(config)
    }
}
