//! Uploaded file model

use std::path::Path;
use std::sync::Arc;

use crate::category::Category;
use crate::handle::FileHandle;

/// A file as submitted by the upload surface, before it is assigned a category
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read an upload from a local path, keeping only the file name
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self { name, content })
    }
}

/// One registered file. The content never changes after registration.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    category: Category,
    content: Arc<[u8]>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, category: Category, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            category,
            content: content.into(),
        }
    }

    pub fn from_upload(upload: Upload, category: Category) -> Self {
        Self::new(upload.name, category, upload.content)
    }

    /// Original file name as uploaded
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Byte length of the content
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_name(&self.name)
    }

    /// Fresh handle positioned at the start of the content
    pub fn handle(&self) -> FileHandle {
        FileHandle::new(self.name.clone(), self.category, Arc::clone(&self.content))
    }
}

/// How a file is decoded, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.csv`
    DelimitedText,
    /// `.xlsx` or `.xls`
    Spreadsheet,
}

impl FileKind {
    /// Dispatch on the (case-insensitive) extension; `None` for anything unsupported
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        match extension.as_str() {
            "xlsx" | "xls" => Some(FileKind::Spreadsheet),
            "csv" => Some(FileKind::DelimitedText),
            _ => None,
        }
    }

    /// Format label for the uploaded files overview
    pub fn format_label(kind: Option<FileKind>) -> &'static str {
        match kind {
            Some(FileKind::Spreadsheet) => "Excel",
            Some(FileKind::DelimitedText) => "CSV",
            None => "Unknown",
        }
    }
}
