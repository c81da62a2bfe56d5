use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Directory names never treated as scan roots, together with their subtrees.
const EXCLUDED_DIRS: &[&str] = &["vendor", "Godeps", "node_modules", "testdata", "internal"];

/// Directories whose name ends like this only hold test code.
const TEST_ONLY_SUFFIX: &str = "_test";

/// Enumerates directories that directly contain Go source files.
#[derive(Debug, Clone, Default)]
pub struct PackageScanner {
    max_depth: Option<usize>,
}

impl PackageScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds how deep below the root the walk descends.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Lazily walks `root`, following symlinked directories.
    ///
    /// Unreadable directories and symlink loops are logged and skipped.
    pub fn package_dirs<'a>(&self, root: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        let mut walker = WalkDir::new(root).follow_links(true).sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_entry(|entry| entry.file_type().is_dir() && !is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory");
                    None
                }
            })
            .map(DirEntry::into_path)
            .filter(|dir| has_go_files(dir))
    }

    pub fn scan_directory(&self, root: &Path) -> Vec<PathBuf> {
        self.package_dirs(root).collect()
    }
}

fn is_excluded(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    EXCLUDED_DIRS.contains(&name)
        || name.starts_with('.')
        || name.starts_with('_')
        || name.ends_with(TEST_ONLY_SUFFIX)
}

fn has_go_files(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).any(|entry| {
            let path = entry.path();
            path.extension().map_or(false, |ext| ext == "go") && path.is_file()
        }),
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "cannot list directory");
            false
        }
    }
}
