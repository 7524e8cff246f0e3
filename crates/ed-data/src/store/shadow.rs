//! Payload persistence and lookup

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use ed_core::{Category, UploadedFile};

use super::manifest::{read_manifest, tmp_path, write_manifest, ManifestRecord};
use super::StoreLookup;
use crate::config::StoreConfig;
use crate::DataError;

/// Disk mirror of the registry, one directory per category
#[derive(Debug, Clone)]
pub struct ShadowStore {
    config: StoreConfig,
}

impl ShadowStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory holding the payloads of one category
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.config.root.join(category.as_str())
    }

    pub fn manifest_path(&self, category: Category) -> PathBuf {
        self.category_dir(category).join(&self.config.manifest_name)
    }

    /// Write a payload and append it to the category manifest.
    ///
    /// A payload whose name is already taken on disk is stored under
    /// `<stem>_<n>.<ext>`; the record keeps the uploaded name. The manifest
    /// file names count as taken.
    pub fn persist(&self, file: &UploadedFile) -> Result<ManifestRecord, DataError> {
        let category = file.category();
        let dir = self.category_dir(category);
        fs::create_dir_all(&dir)?;

        let manifest_path = self.manifest_path(category);
        let reserved = [manifest_path.clone(), tmp_path(&manifest_path)];
        let backing_path = free_path(&dir, file.name(), &reserved);
        fs::write(&backing_path, file.content())?;

        let record = ManifestRecord {
            name: file.name().to_string(),
            size: file.size(),
            backing_path,
            category,
        };

        let mut records = match read_manifest(&manifest_path) {
            StoreLookup::Found(records) => records,
            StoreLookup::NotFound => Vec::new(),
            StoreLookup::Failed(err) => {
                warn!("Discarding unreadable manifest {}: {}", manifest_path.display(), err);
                Vec::new()
            }
        };

        let already_listed = records
            .iter()
            .any(|r| r.name == record.name && r.backing_path == record.backing_path);
        if !already_listed {
            records.push(record.clone());
            write_manifest(&manifest_path, &records)?;
        }

        debug!("Persisted {} to {}", record.name, record.backing_path.display());
        Ok(record)
    }

    /// Manifest records of a category whose payload still exists, in upload order.
    ///
    /// Duplicated names are all returned.
    pub fn load(&self, category: Category) -> StoreLookup<Vec<ManifestRecord>> {
        read_manifest(&self.manifest_path(category)).map(|records| {
            records
                .into_iter()
                .filter(|record| record.backing_path.exists())
                .collect()
        })
    }

    /// Load the bytes behind a record
    pub fn read_payload(&self, record: &ManifestRecord) -> Result<Arc<[u8]>, DataError> {
        let bytes = fs::read(&record.backing_path)?;
        Ok(Arc::from(bytes))
    }

    /// Delete every payload stored under `name` and drop their manifest rows.
    ///
    /// The manifest itself is deleted once it no longer lists anything.
    /// Returns the number of records removed.
    pub fn remove(&self, name: &str, category: Category) -> Result<usize, DataError> {
        let manifest_path = self.manifest_path(category);
        let records = match read_manifest(&manifest_path) {
            StoreLookup::Found(records) => records,
            StoreLookup::NotFound => return Ok(0),
            StoreLookup::Failed(err) => return Err(err),
        };

        let (removed, kept): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.name == name);
        for record in &removed {
            remove_payload(&record.backing_path);
        }

        if kept.is_empty() {
            remove_if_exists(&manifest_path)?;
        } else if !removed.is_empty() {
            write_manifest(&manifest_path, &kept)?;
        }

        Ok(removed.len())
    }

    /// Delete all payloads and the manifest of a category.
    ///
    /// An unreadable manifest is deleted anyway and its error returned.
    pub fn clear(&self, category: Category) -> Result<usize, DataError> {
        let manifest_path = self.manifest_path(category);
        match read_manifest(&manifest_path) {
            StoreLookup::Found(records) => {
                for record in &records {
                    remove_payload(&record.backing_path);
                }
                remove_if_exists(&manifest_path)?;
                Ok(records.len())
            }
            StoreLookup::NotFound => Ok(0),
            StoreLookup::Failed(err) => {
                remove_if_exists(&manifest_path)?;
                Err(err)
            }
        }
    }
}

/// First path for `name` inside `dir` that neither exists nor is `reserved`
fn free_path(dir: &Path, name: &str, reserved: &[PathBuf]) -> PathBuf {
    let taken = |path: &Path| path.exists() || reserved.iter().any(|r| r == path);

    let file_name = sanitize_filename::sanitize(name);
    let candidate = dir.join(&file_name);
    if !taken(&candidate) {
        return candidate;
    }

    let as_path = Path::new(&file_name);
    let stem = as_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name.as_str())
        .to_string();
    let extension = as_path.extension().and_then(|e| e.to_str());

    (1u32..)
        .map(|counter| match extension {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, counter, ext)),
            None => dir.join(format!("{}_{}", stem, counter)),
        })
        .find(|path| !taken(path))
        .unwrap_or(candidate)
}

/// Best-effort payload deletion
fn remove_payload(path: &Path) {
    if let Err(err) = remove_if_exists(path) {
        warn!("Could not delete {}: {}", path.display(), err);
    }
}

fn remove_if_exists(path: &Path) -> Result<(), DataError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MANIFEST_NAME;

    fn store(dir: &Path) -> ShadowStore {
        ShadowStore::new(StoreConfig::at(dir))
    }

    fn upload(name: &str, content: &[u8]) -> UploadedFile {
        UploadedFile::new(name, Category::Descriptive, content.to_vec())
    }

    #[test]
    fn test_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let content = b"id;waarde\n1;10\n\xe9\xff\x00".to_vec();

        let record = store.persist(&upload("data.csv", &content)).unwrap();
        assert_eq!(record.size, content.len() as u64);
        assert_eq!(&*store.read_payload(&record).unwrap(), content.as_slice());
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let first = store.persist(&upload("data.csv", b"first")).unwrap();
        let second = store.persist(&upload("data.csv", b"second")).unwrap();
        let third = store.persist(&upload("data.csv", b"third")).unwrap();

        let category_dir = store.category_dir(Category::Descriptive);
        assert_eq!(first.backing_path, category_dir.join("data.csv"));
        assert_eq!(second.backing_path, category_dir.join("data_1.csv"));
        assert_eq!(third.backing_path, category_dir.join("data_2.csv"));

        let records = store.load(Category::Descriptive).found().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.name == "data.csv"));
        assert_eq!(&*store.read_payload(&records[1]).unwrap(), b"second");
    }

    #[test]
    fn test_free_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), b"x").unwrap();
        assert_eq!(free_path(dir.path(), "README", &[]), dir.path().join("README_1"));
    }

    #[test]
    fn test_upload_named_like_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let content = b"naam;plaats\nJos;Ede\n";

        let record = store.persist(&upload(DEFAULT_MANIFEST_NAME, content)).unwrap();
        let category_dir = store.category_dir(Category::Descriptive);
        assert_eq!(record.backing_path, category_dir.join("files_manifest_1.json"));

        let records = store.load(Category::Descriptive).found().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, DEFAULT_MANIFEST_NAME);
        assert_eq!(&*store.read_payload(&records[0]).unwrap(), &content[..]);
    }

    #[test]
    fn test_free_path_skips_reserved_names() {
        let dir = tempfile::tempdir().unwrap();
        let reserved = [dir.path().join("m.json"), dir.path().join("m.json.tmp")];
        assert_eq!(free_path(dir.path(), "m.json", &reserved), dir.path().join("m_1.json"));
        assert_eq!(free_path(dir.path(), "m.json.tmp", &reserved), dir.path().join("m.json_1.tmp"));
    }

    #[test]
    fn test_load_skips_missing_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let gone = store.persist(&upload("gone.csv", b"a")).unwrap();
        store.persist(&upload("kept.csv", b"b")).unwrap();
        fs::remove_file(&gone.backing_path).unwrap();

        let names: Vec<_> = store
            .load(Category::Descriptive)
            .found()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["kept.csv"]);
    }

    #[test]
    fn test_remove_deletes_duplicates_and_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let a = store.persist(&upload("data.csv", b"1")).unwrap();
        let b = store.persist(&upload("data.csv", b"2")).unwrap();
        let other = store.persist(&upload("other.csv", b"3")).unwrap();

        assert_eq!(store.remove("data.csv", Category::Descriptive).unwrap(), 2);
        assert!(!a.backing_path.exists());
        assert!(!b.backing_path.exists());
        assert!(other.backing_path.exists());
        assert!(store.manifest_path(Category::Descriptive).exists());

        assert_eq!(store.remove("other.csv", Category::Descriptive).unwrap(), 1);
        assert!(!store.manifest_path(Category::Descriptive).exists());
        assert!(matches!(store.load(Category::Descriptive), StoreLookup::NotFound));
    }

    #[test]
    fn test_remove_unknown_name_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(store.remove("missing.csv", Category::Forecast).unwrap(), 0);

        store.persist(&upload("data.csv", b"1")).unwrap();
        assert_eq!(store.remove("missing.csv", Category::Descriptive).unwrap(), 0);
        assert_eq!(store.load(Category::Descriptive).found().unwrap().len(), 1);
    }

    #[test]
    fn test_clear_with_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let manifest = store.manifest_path(Category::Forecast);
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, b"garbage").unwrap();

        assert!(store.load(Category::Forecast).is_failed());
        assert!(store.clear(Category::Forecast).is_err());
        assert!(!manifest.exists());
    }
}
