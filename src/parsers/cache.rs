use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::DirectoryImports;
use crate::core::LocateError;

type Entry = Result<Arc<DirectoryImports>, LocateError>;

/// Thread-safe, run-scoped memo of directory import headers.
///
/// Several import names can land on the same directory (vendored copies,
/// relative imports, the `.` marker); each directory is read once.
#[derive(Debug, Default)]
pub struct ImportCache {
    entries: DashMap<PathBuf, Entry>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached header for `dir`, reading it with `read` on a miss.
    /// Failures are cached too.
    pub fn get_or_read<F>(&self, dir: &Path, read: F) -> Entry
    where
        F: FnOnce(&Path) -> Result<DirectoryImports, LocateError>,
    {
        if let Some(entry) = self.entries.get(dir) {
            return entry.value().clone();
        }

        let entry = read(dir).map(Arc::new);
        self.entries
            .entry(dir.to_path_buf())
            .or_insert(entry)
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
