// Trainer configuration
// Optional JSON file; every field has a default

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::events::history::DEFAULT_HISTORY_LEN;
use crate::events::IndexBackend;
use crate::state::storage::{get_app_data_dir, StorageResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Directory holding `vals0.dat` .. `vals9.dat`
    /// Defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Use the k-d tree index when it is compiled in
    pub use_index: bool,

    /// Number of recent classifications used for smoothing
    pub history_len: usize,

    /// Log level for the binary (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            data_dir: None,
            use_index: true,
            history_len: DEFAULT_HISTORY_LEN,
            log_level: "info".to_string(),
        }
    }
}

impl TrainerConfig {
    pub fn from_json_bytes(data: &[u8]) -> ConfigResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_json_bytes(&data)
    }

    /// Configured store directory, falling back to the app data directory
    pub fn resolve_data_dir(&self) -> StorageResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_app_data_dir(),
        }
    }

    pub fn backend(&self) -> IndexBackend {
        IndexBackend::select(self.use_index)
    }
}
