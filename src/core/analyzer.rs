use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::context::ResolutionContext;
use super::graph::{DependencyGraph, GraphBuilder};
use super::locator::{ImportMode, LocateError, Locator};
use super::package::{IgnorePattern, Package, ROOT_MARKER};
use super::resolver::{PackageResolver, ResolveOptions};
use super::scanner::PackageScanner;

/// Failures that stop a scan before any graph exists.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot resolve scan root {}: {source}", .path.display())]
    RootPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no package can be located at scan root {}: {source}", .path.display())]
    RootPackage {
        path: PathBuf,
        #[source]
        source: LocateError,
    },
}

/// Result of a completed scan, possibly with gaps.
#[derive(Debug)]
pub struct TreeReport {
    pub graph: DependencyGraph,
    /// Resolved root packages, virtual root first.
    pub roots: Vec<Arc<Package>>,
    /// Import names that could not be resolved, sorted.
    pub unresolved: BTreeSet<String>,
}

impl TreeReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Scans a source tree and builds its import graph.
pub struct DependencyAnalyzer<'a, L: Locator + ?Sized> {
    locator: &'a L,
    scanner: PackageScanner,
    ignore_patterns: Vec<IgnorePattern>,
    options: ResolveOptions,
}

impl<'a, L: Locator + ?Sized> DependencyAnalyzer<'a, L> {
    pub fn new(locator: &'a L) -> Self {
        Self {
            locator,
            scanner: PackageScanner::new(),
            ignore_patterns: Vec::new(),
            options: ResolveOptions::default(),
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<IgnorePattern>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_scanner(mut self, scanner: PackageScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn resolve_tree(&self, root_path: &Path) -> Result<TreeReport, ResolveError> {
        let root = root_path
            .canonicalize()
            .map_err(|source| ResolveError::RootPath {
                path: root_path.to_path_buf(),
                source,
            })?;

        self.locator
            .import(ROOT_MARKER, &root, ImportMode::LocateOnly)
            .map_err(|source| ResolveError::RootPackage {
                path: root.clone(),
                source,
            })?;

        let mut ctx = ResolutionContext::new(self.ignore_patterns.clone());
        let resolver = PackageResolver::new(self.locator, self.options.clone());

        info!(root = %root.display(), "resolving packages");
        let mut roots = vec![self.resolve_root(&resolver, &root, &mut ctx)];

        for dir in self.scanner.package_dirs(&root) {
            if dir == root {
                continue;
            }
            roots.push(self.resolve_root(&resolver, &dir, &mut ctx));
        }

        // Roots dropped by an ignore pattern or without buildable files
        // carry no canonical path.
        roots.retain(|package| package.is_located());
        info!(
            roots = roots.len(),
            memoized = ctx.cache_len(),
            unresolved = ctx.unresolved().len(),
            "building graph"
        );

        let graph = GraphBuilder::assemble(&roots);
        let unresolved = ctx.into_unresolved();
        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "some imports could not be resolved");
        }

        Ok(TreeReport {
            graph,
            roots,
            unresolved,
        })
    }

    /// Resolves the package in `dir`, reusing a memoized package when one
    /// already exists for its canonical path.
    fn resolve_root(
        &self,
        resolver: &PackageResolver<'_, L>,
        dir: &Path,
        ctx: &mut ResolutionContext,
    ) -> Arc<Package> {
        let package = resolver.resolve_shared(ROOT_MARKER, dir, &[], ctx);
        debug!(dir = %dir.display(), import_path = %package.canonical_path, "root resolved");
        package
    }
}
