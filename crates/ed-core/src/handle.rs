//! Uniform byte handle over registered file content
//!
//! Every page reads files through [`FileHandle`], whether the bytes came from
//! a live upload or from the on-disk shadow store. The content is an
//! immutable snapshot shared between handles; each handle owns its cursor.

use std::io::{self, BufRead, Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::category::Category;
use crate::file::FileKind;

/// Seekable, read-only view of a file's bytes
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    category: Category,
    content: Arc<[u8]>,
    position: usize,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, category: Category, content: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            category,
            content,
            position: 0,
        }
    }

    /// Original upload name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_name(&self.name)
    }

    /// Read up to `size` bytes, or everything that remains when `size` is `None`
    pub fn read_bytes(&mut self, size: Option<usize>) -> Vec<u8> {
        let remaining = &self.content[self.position..];
        let take = size.map_or(remaining.len(), |n| n.min(remaining.len()));
        let data = remaining[..take].to_vec();
        self.position += take;
        data
    }

    /// Read through the next `\n` (included), or to the end of the content
    pub fn read_line_bytes(&mut self) -> Vec<u8> {
        let remaining = &self.content[self.position..];
        let end = remaining
            .iter()
            .position(|&b| b == b'\n')
            .map_or(remaining.len(), |idx| idx + 1);
        let line = remaining[..end].to_vec();
        self.position += end;
        line
    }

    /// Move the cursor, clamping the result to `[0, size]`
    pub fn seek_clamped(&mut self, pos: SeekFrom) -> u64 {
        let len = self.content.len() as i128;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
            SeekFrom::End(offset) => len + offset as i128,
        };
        self.position = target.clamp(0, len) as usize;
        self.position as u64
    }

    /// Current cursor position
    pub fn tell(&self) -> u64 {
        self.position as u64
    }

    /// Move the cursor back to the start
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// All bytes, independent of the cursor
    pub fn get_buffer(&self) -> &[u8] {
        &self.content
    }

    /// Shared content, for callers that need an owned snapshot
    pub fn content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.content[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl BufRead for FileHandle {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.content[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = (self.position + amt).min(self.content.len());
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_clamped(pos))
    }
}
