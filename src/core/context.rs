use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use super::package::{IgnorePattern, Package};

/// Shared state for one resolution run.
///
/// A context is created per invocation and dropped at the end; nothing here is
/// process-wide.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Keyed by canonical import path, like `seen_imports`.
    package_cache: HashMap<String, Arc<Package>>,
    seen_imports: HashSet<String>,
    unresolved: BTreeSet<String>,
    ignore_patterns: Vec<IgnorePattern>,
}

impl ResolutionContext {
    pub fn new(ignore_patterns: Vec<IgnorePattern>) -> Self {
        Self {
            ignore_patterns,
            ..Self::default()
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore_patterns.iter().any(|p| p.matches(name))
    }

    /// Records `name` as requested. Returns whether it had been requested before.
    pub fn mark_seen(&mut self, name: &str) -> bool {
        if self.seen_imports.contains(name) {
            return true;
        }
        self.seen_imports.insert(name.to_string());
        false
    }

    pub fn has_seen(&self, name: &str) -> bool {
        self.seen_imports.contains(name)
    }

    pub fn cached(&self, name: &str) -> Option<Arc<Package>> {
        self.package_cache.get(name).cloned()
    }

    /// Stores a completed package. The first completion for a name wins.
    pub fn cache(&mut self, name: &str, package: Arc<Package>) {
        self.package_cache
            .entry(name.to_string())
            .or_insert(package);
    }

    pub fn cache_len(&self) -> usize {
        self.package_cache.len()
    }

    pub fn record_unresolved(&mut self, name: &str) {
        self.unresolved.insert(name.to_string());
    }

    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    pub fn into_unresolved(self) -> BTreeSet<String> {
        self.unresolved
    }
}
