//! Shadow store location

use std::path::PathBuf;
use serde::{Serialize, Deserialize};

/// Directory under the OS temp dir that holds the shadow store
pub const DEFAULT_STORE_DIR: &str = "enrollment_dashboard_files";
/// File name of the per-category manifest
pub const DEFAULT_MANIFEST_NAME: &str = "files_manifest.json";

/// Where uploaded files are mirrored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory, one subdirectory per category below it
    pub root: PathBuf,

    /// Manifest file name inside each category directory
    pub manifest_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join(DEFAULT_STORE_DIR),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }
}

impl StoreConfig {
    /// Store rooted at `root` with the default manifest name
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}
