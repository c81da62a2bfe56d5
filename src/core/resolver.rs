use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::context::ResolutionContext;
use super::locator::{ImportMode, LocateError, Locator};
use super::package::{dependency_order, Package, CGO_MARKER, ROOT_MARKER};

/// Prefix used by old standard library layouts for packages that now live
/// under `vendor/`.
const LEGACY_VENDOR_PREFIX: &str = "golang_org";

/// Knobs beyond the default resolution rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Keep standard packages as leaf dependencies instead of dropping them.
    pub include_builtin: bool,
    /// Expand `_test.go` imports of packages requested through `.`.
    pub include_tests: bool,
    /// Packages with at least this many ancestors are located but not expanded.
    pub max_depth: Option<usize>,
}

/// How far a single resolution attempt got.
enum Step {
    /// A completed package already exists for the canonical path.
    Memoized(Arc<Package>),
    /// The attempt finished; the result may be memoized.
    Finished,
    /// Failed, cut short, or specific to this request; never memoized.
    Unfinished,
}

/// Recursive, memoized, cycle-safe import resolver.
pub struct PackageResolver<'a, L: Locator + ?Sized> {
    locator: &'a L,
    options: ResolveOptions,
}

impl<'a, L: Locator + ?Sized> PackageResolver<'a, L> {
    pub fn new(locator: &'a L, options: ResolveOptions) -> Self {
        Self { locator, options }
    }

    /// Resolves `name` as seen from `src_dir`.
    ///
    /// `ancestors` holds the canonical paths of the transitive importers and is
    /// only used to break import cycles. Failures never propagate: they end up
    /// in the context's unresolved set and the package keeps no dependencies.
    pub fn resolve(
        &self,
        name: &str,
        src_dir: &Path,
        ancestors: &[String],
        ctx: &mut ResolutionContext,
    ) -> Package {
        let package = self.resolve_shared(name, src_dir, ancestors, ctx);
        Arc::try_unwrap(package).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Like [`resolve`](Self::resolve), but hands out the memoized package
    /// itself when its canonical path was already resolved in this run.
    pub fn resolve_shared(
        &self,
        name: &str,
        src_dir: &Path,
        ancestors: &[String],
        ctx: &mut ResolutionContext,
    ) -> Arc<Package> {
        let mut package = Package::new(name);
        let step = self.expand(&mut package, src_dir, ancestors, ctx);
        package.is_resolved = true;

        match step {
            Step::Memoized(hit) => hit,
            Step::Finished => {
                let package = Arc::new(package);
                ctx.cache(&package.canonical_path, Arc::clone(&package));
                package
            }
            Step::Unfinished => Arc::new(package),
        }
    }

    fn expand(
        &self,
        package: &mut Package,
        src_dir: &Path,
        ancestors: &[String],
        ctx: &mut ResolutionContext,
    ) -> Step {
        let Some(lookup) = clean_name(&package.requested_name) else {
            return Step::Unfinished;
        };
        let is_root = package.requested_name == ROOT_MARKER;

        let located = match self.locator.import(&lookup, src_dir, ImportMode::LocateOnly) {
            Ok(located) => located,
            Err(err) => {
                self.record_failure(package, src_dir, &err, ctx);
                return Step::Unfinished;
            }
        };
        let canonical = located.import_path;

        if is_root && ctx.is_ignored(&canonical) {
            debug!(import_path = %canonical, "root excluded by ignore pattern");
            return Step::Unfinished;
        }

        // Test imports make a root differ from the same package imported
        // elsewhere.
        let shares_memo = !(is_root && self.options.include_tests);
        if shares_memo {
            if let Some(hit) = ctx.cached(&canonical) {
                return Step::Memoized(hit);
            }
        }

        let cyclic = ctx.mark_seen(&canonical) && ancestors.iter().any(|a| *a == canonical);
        let too_deep = self
            .options
            .max_depth
            .map_or(false, |max| ancestors.len() >= max);

        if located.goroot {
            package.canonical_path = canonical;
            package.directory = located.dir;
            package.is_builtin = true;
            return Step::Finished;
        }
        if cyclic || too_deep {
            debug!(import_path = %canonical, cyclic, too_deep, "located without expansion");
            package.canonical_path = canonical;
            package.directory = located.dir;
            return Step::Unfinished;
        }

        let full = match self.locator.import(&lookup, src_dir, ImportMode::Full) {
            Ok(full) => full,
            Err(LocateError::NoGoFiles(dir)) if is_root => {
                debug!(dir = %dir.display(), "no buildable files at root");
                return Step::Unfinished;
            }
            Err(err) => {
                self.record_failure(package, src_dir, &err, ctx);
                return Step::Unfinished;
            }
        };

        package.canonical_path = full.import_path;
        package.directory = full.dir;

        let mut imports = full.imports;
        if is_root && self.options.include_tests {
            imports.extend(full.test_imports);
        }

        let mut chain = Vec::with_capacity(ancestors.len() + 1);
        chain.extend_from_slice(ancestors);
        chain.push(package.canonical_path.clone());

        self.set_deps(package, &imports, &chain, ctx);
        if shares_memo {
            Step::Finished
        } else {
            Step::Unfinished
        }
    }

    fn record_failure(
        &self,
        package: &Package,
        src_dir: &Path,
        err: &LocateError,
        ctx: &mut ResolutionContext,
    ) {
        debug!(name = %package.requested_name, error = %err, "unresolved import");
        // "." alone says nothing about which root failed.
        if package.requested_name == ROOT_MARKER {
            ctx.record_unresolved(&src_dir.to_string_lossy());
        } else {
            ctx.record_unresolved(&package.requested_name);
        }
    }

    /// Resolves the direct imports of `package` into its dependency list.
    fn set_deps(
        &self,
        package: &mut Package,
        imports: &[String],
        chain: &[String],
        ctx: &mut ResolutionContext,
    ) {
        let mut listed: HashSet<&str> = HashSet::with_capacity(imports.len());
        let mut deps: Vec<Arc<Package>> = Vec::with_capacity(imports.len());

        for import in imports.iter().map(String::as_str) {
            if import == package.canonical_path
                || !listed.insert(import)
                || import == CGO_MARKER
                || ctx.is_ignored(import)
            {
                continue;
            }

            let dep = self.resolve_shared(import, &package.directory, chain, ctx);
            // Relative and vendored names can still point back at the importer.
            if dep.name() == package.canonical_path {
                continue;
            }
            if dep.is_builtin && !self.options.include_builtin {
                continue;
            }
            if dep.is_internal() {
                deps.extend(
                    dep.dependencies
                        .iter()
                        .filter(|spliced| spliced.name() != package.canonical_path)
                        .cloned(),
                );
                continue;
            }
            deps.push(dep);
        }

        let mut unique = HashSet::with_capacity(deps.len());
        deps.retain(|dep| unique.insert(dep.name().to_string()));
        deps.sort_by(|a, b| dependency_order(a, b));
        package.dependencies = deps;
    }
}

/// `None` for the cgo marker; legacy names are mapped onto `vendor/`.
fn clean_name(name: &str) -> Option<String> {
    if name == CGO_MARKER {
        return None;
    }
    if name.starts_with(LEGACY_VENDOR_PREFIX) {
        return Some(format!("vendor/{name}"));
    }
    Some(name.to_string())
}
