//! Dashboard settings

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use ed_data::{DecoderConfig, StoreConfig};

/// Environment variable naming an optional JSON settings file
pub const SETTINGS_ENV: &str = "ED_SETTINGS";
/// Environment variable overriding the shadow store root
pub const STORE_DIR_ENV: &str = "ED_STORE_DIR";

/// Everything the dashboard can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Shadow store location
    pub store: StoreConfig,

    /// Encoding/delimiter probing and null handling
    pub decoder: DecoderConfig,

    /// Rows shown in the file preview
    pub preview_rows: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            decoder: DecoderConfig::default(),
            preview_rows: 5,
        }
    }
}

impl DashboardSettings {
    /// Settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let file = std::env::var_os(SETTINGS_ENV).map(PathBuf::from);
        let store_dir = std::env::var_os(STORE_DIR_ENV).map(PathBuf::from);
        Self::load(file.as_deref(), store_dir)
    }

    /// Read `file` if given, then apply the store root override.
    ///
    /// An unreadable or malformed file is logged and ignored.
    pub fn load(file: Option<&Path>, store_dir: Option<PathBuf>) -> Self {
        let mut settings = match file {
            Some(path) => match Self::read(path) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    warn!("Ignoring settings file {}: {}", path.display(), err);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        if let Some(root) = store_dir {
            settings.store.root = root;
        }
        settings
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
