//! Per-category manifest file

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use ed_core::Category;

use super::StoreLookup;
use crate::DataError;

/// One persisted payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Name the file was uploaded under
    pub name: String,
    /// Byte length at upload time
    pub size: u64,
    /// Where the payload actually lives, possibly with a numeric suffix
    pub backing_path: PathBuf,
    pub category: Category,
}

/// Read a manifest, distinguishing "never written" from "unreadable"
pub fn read_manifest(path: &Path) -> StoreLookup<Vec<ManifestRecord>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return StoreLookup::NotFound,
        Err(err) => return StoreLookup::Failed(err.into()),
    };

    match serde_json::from_slice(&bytes) {
        Ok(records) => StoreLookup::Found(records),
        Err(err) => StoreLookup::Failed(err.into()),
    }
}

/// Scratch file a manifest is written to before the rename
pub fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Replace the manifest with `records`
pub fn write_manifest(path: &Path, records: &[ManifestRecord]) -> Result<(), DataError> {
    let json = serde_json::to_vec_pretty(records)?;

    // Write next to the target and rename so readers never see a half-written file
    let tmp_path = tmp_path(path);
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, dir: &Path) -> ManifestRecord {
        ManifestRecord {
            name: name.to_string(),
            size: 3,
            backing_path: dir.join(name),
            category: Category::Forecast,
        }
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_manifest(&dir.path().join("nope.json")), StoreLookup::NotFound));
    }

    #[test]
    fn test_corrupt_manifest_is_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(read_manifest(&path).is_failed());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let records = vec![record("a.csv", dir.path()), record("b.xlsx", dir.path())];

        write_manifest(&path, &records).unwrap();

        assert_eq!(read_manifest(&path).found(), Some(records));
        assert!(!dir.path().join("manifest.json.tmp").exists());
    }
}
