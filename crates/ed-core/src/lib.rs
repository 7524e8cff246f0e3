//! Core types for the enrollment dashboard
//!
//! This crate provides the upload categories, the uploaded file model and
//! the uniform byte handle that every dashboard page reads files through.

pub mod category;
pub mod file;
pub mod handle;

// Re-export commonly used types
pub use category::{Category, ParseCategoryError};
pub use file::{FileKind, Upload, UploadedFile};
pub use handle::FileHandle;
