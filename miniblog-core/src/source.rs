//! Reading content and sidecar files.

use std::io;
use std::path::Path;

/// Source of raw file text for content items.
///
/// Discovery still walks the real directory tree; only the reads of content
/// bodies and sidecars go through this trait.
pub trait SourceReader: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads straight from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
