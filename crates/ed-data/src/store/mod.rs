//! On-disk shadow of the uploaded files
//!
//! Each category gets its own directory below the store root holding the
//! payload files and one JSON manifest. The store is a convenience cache:
//! callers decide how to degrade when a lookup fails.

pub mod manifest;
pub mod shadow;

pub use manifest::ManifestRecord;
pub use shadow::ShadowStore;

use crate::DataError;

/// Outcome of reading something from the store
#[derive(Debug)]
pub enum StoreLookup<T> {
    /// The data exists and could be read
    Found(T),
    /// Nothing has been stored yet
    NotFound,
    /// The data exists but could not be read or parsed
    Failed(DataError),
}

impl<T> StoreLookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StoreLookup<U> {
        match self {
            StoreLookup::Found(value) => StoreLookup::Found(f(value)),
            StoreLookup::NotFound => StoreLookup::NotFound,
            StoreLookup::Failed(err) => StoreLookup::Failed(err),
        }
    }

    /// The value if it was found, discarding the reason otherwise
    pub fn found(self) -> Option<T> {
        match self {
            StoreLookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, StoreLookup::Found(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StoreLookup::Failed(_))
    }
}
