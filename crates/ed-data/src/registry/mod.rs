//! Session catalog of uploaded files backed by the shadow store
//!
//! Every operation is best-effort: store failures are logged and degrade to
//! "no files" or "skip this entry". Use [`FileRegistry::store_status`] to
//! tell an empty store from a broken one.

use std::path::PathBuf;
use ahash::AHashMap;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use ed_core::{Category, FileHandle, Upload, UploadedFile};

use crate::store::{ManifestRecord, ShadowStore, StoreLookup};

#[derive(Debug, Clone)]
struct CatalogEntry {
    file: UploadedFile,
    /// Where the shadow copy lives, if persisting it worked
    backing_path: Option<PathBuf>,
}

/// Uploaded files per category, in upload order, one entry per name
pub struct FileRegistry {
    store: ShadowStore,
    catalogs: AHashMap<Category, IndexMap<String, CatalogEntry>>,
}

impl FileRegistry {
    /// Open a registry on `store`, rehydrating it from disk
    pub fn open(store: ShadowStore) -> Self {
        let mut registry = Self {
            store,
            catalogs: AHashMap::new(),
        };
        registry.rehydrate();
        registry
    }

    pub fn store(&self) -> &ShadowStore {
        &self.store
    }

    /// Refill every empty category from the shadow store.
    ///
    /// When a name was persisted more than once the first record wins.
    pub fn rehydrate(&mut self) {
        for category in Category::ALL {
            if self.catalogs.get(&category).is_some_and(|c| !c.is_empty()) {
                continue;
            }

            let records = match self.store.load(category) {
                StoreLookup::Found(records) => records,
                StoreLookup::NotFound => continue,
                StoreLookup::Failed(err) => {
                    warn!("Could not rehydrate {} files: {}", category, err);
                    continue;
                }
            };

            let catalog = self.catalogs.entry(category).or_default();
            for record in records {
                if catalog.contains_key(&record.name) {
                    continue;
                }
                match self.store.read_payload(&record) {
                    Ok(content) => {
                        let file = UploadedFile::new(record.name.clone(), category, content);
                        catalog.insert(
                            record.name,
                            CatalogEntry {
                                file,
                                backing_path: Some(record.backing_path),
                            },
                        );
                    }
                    Err(err) => warn!("Skipping {} from {}: {}", record.name, record.backing_path.display(), err),
                }
            }

            if !catalog.is_empty() {
                info!("Rehydrated {} {} file(s) from {}", catalog.len(), category, self.store.category_dir(category).display());
            }
        }
    }

    /// Add uploads to a category and persist them.
    ///
    /// Names already registered in the category are skipped. Returns how
    /// many files were added.
    pub fn register(&mut self, files: impl IntoIterator<Item = Upload>, category: Category) -> usize {
        let mut added = 0;

        for upload in files {
            let catalog = self.catalogs.entry(category).or_default();
            if catalog.contains_key(&upload.name) {
                debug!("{} is already registered as {}", upload.name, category);
                continue;
            }

            let file = UploadedFile::from_upload(upload, category);
            let backing_path = match self.store.persist(&file) {
                Ok(record) => Some(record.backing_path),
                Err(err) => {
                    warn!("Could not persist {}: {}", file.name(), err);
                    None
                }
            };

            info!("Registered {} ({} bytes) as {}", file.name(), file.size(), category);
            catalog.insert(file.name().to_string(), CatalogEntry { file, backing_path });
            added += 1;
        }

        added
    }

    /// Handles for a category, or every category.
    ///
    /// Files present only in the shadow store are appended after the
    /// in-memory ones.
    pub fn list(&self, category: Option<Category>) -> Vec<FileHandle> {
        let mut handles = Vec::new();

        for category in Category::selection(category) {
            let catalog = self.catalogs.get(&category);
            if let Some(catalog) = catalog {
                handles.extend(catalog.values().map(|entry| entry.file.handle()));
            }

            let in_memory = |name: &str| catalog.is_some_and(|c| c.contains_key(name));
            for record in self.shadow_records(category) {
                if in_memory(&record.name) {
                    continue;
                }
                if let Some(handle) = self.shadow_handle(&record) {
                    handles.push(handle);
                }
            }
        }

        handles
    }

    /// First-registered file called `name` in a category
    pub fn get(&self, name: &str, category: Category) -> Option<FileHandle> {
        if let Some(entry) = self.catalogs.get(&category).and_then(|c| c.get(name)) {
            return Some(entry.file.handle());
        }

        self.shadow_records(category)
            .into_iter()
            .find(|record| record.name == name)
            .and_then(|record| self.shadow_handle(&record))
    }

    /// All files of one category
    pub fn files(&self, category: Category) -> Vec<FileHandle> {
        self.list(Some(category))
    }

    /// First file of the first non-empty category
    pub fn first(&self) -> Option<FileHandle> {
        self.list(None).into_iter().next()
    }

    /// Path of the shadow copy of a registered file
    pub fn backing_path(&self, name: &str, category: Category) -> Option<PathBuf> {
        self.catalogs
            .get(&category)
            .and_then(|c| c.get(name))
            .and_then(|entry| entry.backing_path.clone())
    }

    /// Forget `name` in a category and delete its shadow copies
    pub fn remove(&mut self, name: &str, category: Category) {
        let in_memory = self
            .catalogs
            .get_mut(&category)
            .and_then(|c| c.shift_remove(name))
            .is_some();

        match self.store.remove(name, category) {
            Ok(removed) if in_memory || removed > 0 => {
                info!("Removed {} from {} ({} stored copies)", name, category, removed);
            }
            Ok(_) => debug!("Nothing to remove for {} in {}", name, category),
            Err(err) => warn!("Could not remove stored copies of {}: {}", name, err),
        }
    }

    /// Forget every file of a category, or of all categories
    pub fn clear(&mut self, category: Option<Category>) {
        for category in Category::selection(category) {
            self.catalogs.remove(&category);
            match self.store.clear(category) {
                Ok(removed) => info!("Cleared {} files ({} stored copies)", category, removed),
                Err(err) => warn!("Clearing stored {} files failed: {}", category, err),
            }
        }
    }

    /// Number of usable records in the shadow store for a category
    pub fn store_status(&self, category: Category) -> StoreLookup<usize> {
        self.store.load(category).map(|records| records.len())
    }

    /// Number of files held in memory
    pub fn len(&self) -> usize {
        self.catalogs.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shadow_records(&self, category: Category) -> Vec<ManifestRecord> {
        match self.store.load(category) {
            StoreLookup::Found(records) => records,
            StoreLookup::NotFound => Vec::new(),
            StoreLookup::Failed(err) => {
                warn!("Ignoring stored {} files: {}", category, err);
                Vec::new()
            }
        }
    }

    fn shadow_handle(&self, record: &ManifestRecord) -> Option<FileHandle> {
        match self.store.read_payload(record) {
            Ok(content) => Some(FileHandle::new(record.name.clone(), record.category, content)),
            Err(err) => {
                warn!("Skipping {} from {}: {}", record.name, record.backing_path.display(), err);
                None
            }
        }
    }
}
