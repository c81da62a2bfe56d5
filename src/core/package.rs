use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

/// Marker import name meaning "the package in this directory".
pub const ROOT_MARKER: &str = ".";

/// Pseudo-import used by cgo; never resolvable.
pub const CGO_MARKER: &str = "C";

/// A resolved or partially-resolved package.
///
/// Dependencies are shared with the resolution cache rather than copied, so a
/// package reached from many importers is held once.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub requested_name: String,
    pub canonical_path: String,
    pub directory: PathBuf,
    pub is_builtin: bool,
    pub is_resolved: bool,
    #[serde(serialize_with = "serialize_dependency_names")]
    pub dependencies: Vec<Arc<Package>>,
}

impl Package {
    pub fn new(requested_name: impl Into<String>) -> Self {
        Self {
            requested_name: requested_name.into(),
            ..Self::default()
        }
    }

    /// Graph identity: the canonical path once known, otherwise the name the
    /// importer asked for.
    pub fn name(&self) -> &str {
        if self.canonical_path.is_empty() {
            &self.requested_name
        } else {
            &self.canonical_path
        }
    }

    pub fn is_located(&self) -> bool {
        !self.canonical_path.is_empty()
    }

    pub fn is_internal(&self) -> bool {
        is_internal_path(&self.canonical_path)
    }

    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.iter().map(|dep| dep.name()).collect()
    }
}

/// True when any `/`-separated segment of `path` is literally `internal`.
pub fn is_internal_path(path: &str) -> bool {
    path.split('/').any(|segment| segment == "internal")
}

/// Builtin packages first, then ascending by name.
pub fn dependency_order(a: &Package, b: &Package) -> Ordering {
    b.is_builtin
        .cmp(&a.is_builtin)
        .then_with(|| a.name().cmp(b.name()))
}

fn serialize_dependency_names<S>(deps: &[Arc<Package>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(deps.iter().map(|dep| dep.name()))
}

/// An exact import name, or a literal prefix when written with a trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnorePattern {
    Exact(String),
    Prefix(String),
}

impl IgnorePattern {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) => IgnorePattern::Prefix(prefix.to_string()),
            None => IgnorePattern::Exact(raw.to_string()),
        }
    }

    /// Prefix patterns are a plain string test: `foo/bar*` matches `foo/barbaz`.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            IgnorePattern::Exact(exact) => name == exact,
            IgnorePattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// Splits a comma-separated pattern list, dropping empty entries.
pub fn parse_ignore_list(raw: &str) -> Vec<IgnorePattern> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(IgnorePattern::parse)
        .collect()
}
