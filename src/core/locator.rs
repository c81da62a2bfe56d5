//! Go package location rules: GOROOT, Go modules and their download cache,
//! GOPATH and vendor directories, evaluated against the local filesystem only.

use dashmap::DashMap;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::parsers::cache::ImportCache;
use crate::parsers::go::{BuildTarget, GoParser};
use crate::parsers::read_directory;

/// Why an import could not be turned into a package.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("cannot find package {name:?} (from {})", .src_dir.display())]
    NotFound { name: String, src_dir: PathBuf },
    #[error("no buildable Go source files in {}", .0.display())]
    NoGoFiles(PathBuf),
    #[error("{}: {message}", .file.display())]
    Parse { file: PathBuf, message: String },
    #[error("found packages {first} and {second} in {}", .dir.display())]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
    #[error("{}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl LocateError {
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        LocateError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    fn not_found(name: &str, src_dir: &Path) -> Self {
        LocateError::NotFound {
            name: name.to_string(),
            src_dir: src_dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Locate the package and read its imports.
    Full,
    /// Locate the package only; its files are not read.
    LocateOnly,
}

/// What the host rules know about one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedPackage {
    pub import_path: String,
    pub dir: PathBuf,
    /// Part of the standard distribution.
    pub goroot: bool,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
}

/// Turns an import name, seen from `src_dir`, into a located package.
pub trait Locator {
    fn import(
        &self,
        name: &str,
        src_dir: &Path,
        mode: ImportMode,
    ) -> Result<LocatedPackage, LocateError>;
}

/// Top-level directories of the standard library, used when no GOROOT is
/// known.
const STD_ROOTS: &[&str] = &[
    "archive", "bufio", "builtin", "bytes", "cmp", "compress", "container", "context",
    "crypto", "database", "debug", "embed", "encoding", "errors", "expvar", "flag", "fmt",
    "go", "hash", "html", "image", "index", "io", "iter", "log", "maps", "math", "mime",
    "net", "os", "path", "plugin", "reflect", "regexp", "runtime", "slices", "sort",
    "strconv", "strings", "structs", "sync", "syscall", "testing", "text", "time",
    "unicode", "unique", "unsafe", "weak",
];

/// Search paths and build target for [`GoLocator`].
#[derive(Debug, Clone)]
pub struct GoEnv {
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    /// Module download cache; `<first GOPATH>/pkg/mod` when unset.
    pub modcache: Option<PathBuf>,
    pub target: BuildTarget,
    /// Without a GOROOT, treat unlocatable imports under a standard library
    /// top-level directory as standard packages.
    pub std_fallback: bool,
}

impl GoEnv {
    /// Empty search paths for the host target.
    pub fn new() -> Self {
        Self {
            goroot: None,
            gopath: Vec::new(),
            modcache: None,
            target: BuildTarget::host(),
            std_fallback: true,
        }
    }

    /// Reads `GOROOT`, `GOPATH`, `GOMODCACHE`, `GOOS` and `GOARCH`. An unset
    /// `GOROOT` is asked from the installed toolchain.
    pub fn from_env() -> Self {
        let goroot = non_empty_var("GOROOT")
            .map(PathBuf::from)
            .or_else(toolchain_goroot);
        let gopath = match std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
            Some(raw) => std::env::split_paths(&raw).collect(),
            None => non_empty_var("HOME")
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };

        let mut target = BuildTarget::host();
        if let Some(goos) = non_empty_var("GOOS") {
            target.goos = goos;
        }
        if let Some(goarch) = non_empty_var("GOARCH") {
            target.goarch = goarch;
        }

        Self {
            goroot,
            gopath,
            modcache: non_empty_var("GOMODCACHE").map(PathBuf::from),
            target,
            std_fallback: true,
        }
    }

    pub fn with_goroot(mut self, goroot: impl Into<PathBuf>) -> Self {
        self.goroot = Some(goroot.into());
        self
    }

    pub fn with_gopath(mut self, gopath: impl Into<PathBuf>) -> Self {
        self.gopath.push(gopath.into());
        self
    }

    pub fn with_modcache(mut self, modcache: impl Into<PathBuf>) -> Self {
        self.modcache = Some(modcache.into());
        self
    }

    pub fn with_target(mut self, target: BuildTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_std_fallback(mut self, std_fallback: bool) -> Self {
        self.std_fallback = std_fallback;
        self
    }
}

impl Default for GoEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// `go env GOROOT`, if a toolchain is installed.
fn toolchain_goroot() -> Option<PathBuf> {
    let output = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
    if !output.status.success() {
        debug!(status = %output.status, "go env GOROOT failed");
        return None;
    }
    let root = String::from_utf8(output.stdout).ok()?;
    let root = root.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirement {
    path: String,
    version: String,
}

/// The parts of a `go.mod` file that affect package lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GoMod {
    path: String,
    requires: Vec<Requirement>,
}

#[derive(Debug, Clone)]
struct Module {
    root: PathBuf,
    go_mod: Arc<GoMod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Goroot,
    Module,
    Gopath,
}

struct Location {
    dir: PathBuf,
    import_path: String,
    goroot: bool,
}

/// Filesystem [`Locator`] following the Go toolchain's lookup order.
pub struct GoLocator {
    goroot_src: Option<PathBuf>,
    gopath_srcs: Vec<PathBuf>,
    modcache: Option<PathBuf>,
    target: BuildTarget,
    std_fallback: bool,
    parser: GoParser,
    module_directive: Regex,
    require_line: Regex,
    require_block: Regex,
    modules: DashMap<PathBuf, Option<Arc<GoMod>>>,
    imports: ImportCache,
}

impl GoLocator {
    pub fn new(env: GoEnv) -> anyhow::Result<Self> {
        let goroot_src = env.goroot.as_deref().map(|root| canonical_or_self(&root.join("src")));
        let gopath_srcs = env
            .gopath
            .iter()
            .map(|entry| canonical_or_self(&entry.join("src")))
            .collect();
        let modcache = env
            .modcache
            .or_else(|| env.gopath.first().map(|entry| entry.join("pkg").join("mod")))
            .map(|cache| canonical_or_self(&cache));

        Ok(Self {
            goroot_src,
            gopath_srcs,
            modcache,
            target: env.target,
            std_fallback: env.std_fallback,
            parser: GoParser::new()?,
            module_directive: Regex::new(r#"(?m)^\s*module\s+(?:"([^"]+)"|(\S+))"#)?,
            require_line: Regex::new(r"(?m)^\s*require\s+([^(\s].*)$")?,
            require_block: Regex::new(r"(?ms)^\s*require\s*\((.*?)^\s*\)")?,
            modules: DashMap::new(),
            imports: ImportCache::new(),
        })
    }

    /// Number of package directories whose files were read.
    pub fn directories_read(&self) -> usize {
        self.imports.len()
    }

    /// Canonical import path of a package directory, and whether it belongs
    /// to the standard distribution.
    pub fn import_path_for_dir(&self, dir: &Path) -> (String, bool) {
        if let Some(src) = &self.goroot_src {
            if let Some(rel) = relative_slash_path(dir, src) {
                return (rel, true);
            }
        }
        if let Some(import_path) = self.module_cache_import_path(dir) {
            return (import_path, false);
        }
        if let Some(module) = self.module_for(dir) {
            let path = &module.go_mod.path;
            return match relative_slash_path(dir, &module.root) {
                Some(rel) => (format!("{path}/{rel}"), false),
                None => (path.clone(), false),
            };
        }
        for src in &self.gopath_srcs {
            if let Some(rel) = relative_slash_path(dir, src) {
                return (rel, false);
            }
        }
        (local_import_path(dir), false)
    }

    fn locate(&self, name: &str, src_dir: &Path) -> Result<Location, LocateError> {
        if is_local_import(name) {
            let dir = fs::canonicalize(src_dir.join(name))
                .ok()
                .filter(|dir| dir.is_dir())
                .ok_or_else(|| LocateError::not_found(name, src_dir))?;
            let (import_path, goroot) = self.import_path_for_dir(&dir);
            return Ok(Location {
                dir,
                import_path,
                goroot,
            });
        }

        if let Some(found) = self.find_vendored(name, src_dir) {
            return Ok(found);
        }

        if let Some(src) = &self.goroot_src {
            let dir = src.join(name);
            if dir.is_dir() {
                return Ok(Location {
                    dir,
                    import_path: name.to_string(),
                    goroot: true,
                });
            }
        }

        if let Some(module) = self.module_for(src_dir) {
            if let Some(rest) = within_module(name, &module.go_mod.path) {
                let dir = join_slash_path(&module.root, rest);
                if dir.is_dir() {
                    return Ok(Location {
                        dir,
                        import_path: name.to_string(),
                        goroot: false,
                    });
                }
            }
            if let Some(found) = self.find_required(name, &module) {
                return Ok(found);
            }
        }

        for src in &self.gopath_srcs {
            let dir = src.join(name);
            if dir.is_dir() {
                return Ok(Location {
                    dir,
                    import_path: name.to_string(),
                    goroot: false,
                });
            }
        }

        if self.std_fallback && self.goroot_src.is_none() && is_std_name(name) {
            debug!(name, "assuming standard package");
            return Ok(Location {
                dir: PathBuf::new(),
                import_path: name.to_string(),
                goroot: true,
            });
        }

        Err(LocateError::not_found(name, src_dir))
    }

    /// Searches `vendor` directories from `src_dir` up to its source root.
    fn find_vendored(&self, name: &str, src_dir: &Path) -> Option<Location> {
        let (root, kind) = self.source_root_of(src_dir)?;

        for dir in src_dir.ancestors() {
            if !dir.starts_with(&root) {
                break;
            }
            // GOPATH/src/vendor is not a vendor tree.
            if dir == root && kind == RootKind::Gopath {
                break;
            }
            let candidate = dir.join("vendor").join(name);
            if candidate.is_dir() {
                let (import_path, goroot) = self.import_path_for_dir(&candidate);
                return Some(Location {
                    dir: candidate,
                    import_path,
                    goroot,
                });
            }
        }
        None
    }

    /// Searches the module cache for a module required by `module`,
    /// preferring the longest matching module path.
    fn find_required(&self, name: &str, module: &Module) -> Option<Location> {
        let cache = self.modcache.as_ref()?;
        let mut candidates: Vec<&Requirement> = module
            .go_mod
            .requires
            .iter()
            .filter(|req| within_module(name, &req.path).is_some())
            .collect();
        candidates.sort_by_key(|req| std::cmp::Reverse(req.path.len()));

        candidates.into_iter().find_map(|req| {
            let rest = within_module(name, &req.path)?;
            let versioned = format!(
                "{}@{}",
                escape_module_path(&req.path),
                escape_module_path(&req.version)
            );
            let dir = join_slash_path(&cache.join(versioned), rest);
            dir.is_dir().then(|| Location {
                dir,
                import_path: name.to_string(),
                goroot: false,
            })
        })
    }

    /// Import path of a directory inside the module cache, read from its
    /// `<module>@<version>` path element.
    fn module_cache_import_path(&self, dir: &Path) -> Option<String> {
        let rel = relative_slash_path(dir, self.modcache.as_ref()?)?;
        let (module, versioned) = rel.split_once('@')?;
        let module = unescape_module_path(module);
        match versioned.split_once('/') {
            Some((_, tail)) if !tail.is_empty() => Some(format!("{module}/{tail}")),
            _ => Some(module),
        }
    }

    fn source_root_of(&self, dir: &Path) -> Option<(PathBuf, RootKind)> {
        if let Some(src) = &self.goroot_src {
            if dir.starts_with(src) {
                return Some((src.clone(), RootKind::Goroot));
            }
        }
        if let Some(module) = self.module_for(dir) {
            return Some((module.root, RootKind::Module));
        }
        self.gopath_srcs
            .iter()
            .find(|src| dir.starts_with(src))
            .map(|src| (src.clone(), RootKind::Gopath))
    }

    /// Nearest enclosing `go.mod`.
    fn module_for(&self, dir: &Path) -> Option<Module> {
        dir.ancestors().find_map(|candidate| {
            self.go_mod_at(candidate).map(|go_mod| Module {
                root: candidate.to_path_buf(),
                go_mod,
            })
        })
    }

    fn go_mod_at(&self, dir: &Path) -> Option<Arc<GoMod>> {
        if let Some(known) = self.modules.get(dir) {
            return known.value().clone();
        }
        let go_mod = fs::read_to_string(dir.join("go.mod"))
            .ok()
            .and_then(|contents| self.parse_go_mod(&contents))
            .map(Arc::new);
        self.modules.insert(dir.to_path_buf(), go_mod.clone());
        go_mod
    }

    fn parse_go_mod(&self, contents: &str) -> Option<GoMod> {
        let path = self.parse_module_directive(contents)?;

        let block_lines = self
            .require_block
            .captures_iter(contents)
            .filter_map(|captures| captures.get(1))
            .flat_map(|block| block.as_str().lines());
        let single_lines = self
            .require_line
            .captures_iter(contents)
            .filter_map(|captures| captures.get(1))
            .map(|line| line.as_str());
        let requires = block_lines
            .chain(single_lines)
            .filter_map(parse_requirement)
            .collect();

        Some(GoMod { path, requires })
    }

    fn parse_module_directive(&self, contents: &str) -> Option<String> {
        let captures = self.module_directive.captures(contents)?;
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string())
    }
}

impl Locator for GoLocator {
    fn import(
        &self,
        name: &str,
        src_dir: &Path,
        mode: ImportMode,
    ) -> Result<LocatedPackage, LocateError> {
        let location = self.locate(name, src_dir)?;
        let mut located = LocatedPackage {
            import_path: location.import_path,
            dir: location.dir,
            goroot: location.goroot,
            ..LocatedPackage::default()
        };

        // Standard packages are never expanded, so their files stay unread.
        if mode == ImportMode::LocateOnly || located.goroot {
            return Ok(located);
        }

        let header = self
            .imports
            .get_or_read(&located.dir, |dir| read_directory(dir, &self.parser, &self.target))?;
        located.imports = header.imports.clone();
        located.test_imports = header.test_imports.clone();
        Ok(located)
    }
}

fn is_local_import(name: &str) -> bool {
    name == "." || name == ".." || name.starts_with("./") || name.starts_with("../")
}

fn is_std_name(name: &str) -> bool {
    let first = name.split('/').next().unwrap_or_default();
    STD_ROOTS.contains(&first)
}

/// `path version` with optional quotes and a trailing comment.
fn parse_requirement(line: &str) -> Option<Requirement> {
    let line = line.split("//").next().unwrap_or_default();
    let mut fields = line.split_whitespace();
    let path = fields.next()?.trim_matches('"');
    let version = fields.next()?;
    if path.is_empty() || fields.next().is_some() {
        return None;
    }
    Some(Requirement {
        path: path.to_string(),
        version: version.to_string(),
    })
}

/// Remainder of `name` below `module_path`; empty when they are equal.
fn within_module<'n>(name: &'n str, module_path: &str) -> Option<&'n str> {
    if name == module_path {
        return Some("");
    }
    name.strip_prefix(module_path)?.strip_prefix('/')
}

fn join_slash_path(base: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |dir, segment| dir.join(segment))
}

/// Module cache spelling: each upper-case letter becomes `!` plus its lower
/// case form.
fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn unescape_module_path(escaped: &str) -> String {
    let mut path = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        match c {
            '!' => {
                if let Some(next) = chars.next() {
                    path.push(next.to_ascii_uppercase());
                }
            }
            other => path.push(other),
        }
    }
    path
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `dir` relative to `root` with `/` separators; `None` when `dir` is not
/// strictly below `root`.
fn relative_slash_path(dir: &Path, root: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let segments: Vec<_> = rel
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// The toolchain's name for a package outside every search path.
fn local_import_path(dir: &Path) -> String {
    let slashed = dir.to_string_lossy().replace('\\', "/");
    if slashed.starts_with('/') {
        format!("_{slashed}")
    } else {
        format!("_/{slashed}")
    }
}
