use anyhow::{bail, Result};
use regex::Regex;
use std::path::Path;
use tree_sitter::Node as TSNode;

use super::common::{extract_text, find_child_by_kind, find_children_by_kind, TreeSitterParser};

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js",
    "linux", "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Header information read from one Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileImports {
    pub package_name: String,
    pub imports: Vec<String>,
    /// The file carries an `ignore` build constraint.
    pub ignored: bool,
}

/// Reads the package clause and import block of Go files.
pub struct GoParser {
    ignore_constraint: Regex,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ignore_constraint: Regex::new(r"^//(go:build|\s*\+build)\s+ignore\s*$")?,
        })
    }

    pub fn parse_source(&self, source: &str) -> Result<FileImports> {
        let mut parser = TreeSitterParser::new(tree_sitter_go::language())?;
        let tree = parser.parse_source(source)?;
        let source_bytes = source.as_bytes();
        let root = tree.root_node();

        let mut result = FileImports::default();
        let mut seen_package = false;
        let mut cursor = root.walk();

        for child in root.named_children(&mut cursor) {
            let in_header = match child.kind() {
                "comment" | "package_clause" => true,
                "import_declaration" => seen_package,
                "ERROR" => !seen_package || starts_with_token(&child, "import"),
                _ => false,
            };
            // Only the header matters; the body is never inspected.
            if !in_header {
                break;
            }
            if child.is_error() || child.has_error() {
                let row = child.start_position().row + 1;
                bail!("syntax error at line {row}");
            }

            match child.kind() {
                "comment" if !seen_package => {
                    if self
                        .ignore_constraint
                        .is_match(extract_text(&child, source_bytes).trim_end())
                    {
                        result.ignored = true;
                    }
                }
                "package_clause" => {
                    let name = find_child_by_kind(&child, "package_identifier")
                        .map(|ident| extract_text(&ident, source_bytes))
                        .unwrap_or_default();
                    result.package_name = name.to_string();
                    seen_package = true;
                }
                "import_declaration" => {
                    collect_imports(&child, source_bytes, &mut result.imports);
                }
                _ => {}
            }
        }

        if !seen_package {
            bail!("expected 'package' clause");
        }

        Ok(result)
    }
}

fn starts_with_token(node: &TSNode, kind: &str) -> bool {
    node.child(0).map_or(false, |first| first.kind() == kind)
}

fn collect_imports(declaration: &TSNode, source: &[u8], imports: &mut Vec<String>) {
    let specs = match find_child_by_kind(declaration, "import_spec_list") {
        Some(list) => find_children_by_kind(&list, "import_spec"),
        None => find_children_by_kind(declaration, "import_spec"),
    };

    for spec in specs {
        if let Some(path) = spec.child_by_field_name("path") {
            let literal = extract_text(&path, source);
            let unquoted = literal
                .trim_matches(|c| c == '"' || c == '`')
                .to_string();
            if !unquoted.is_empty() {
                imports.push(unquoted);
            }
        }
    }
}

/// The GOOS/GOARCH pair files are filtered against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub goos: String,
    pub goarch: String,
}

impl BuildTarget {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// Maps the Rust host target onto Go's names.
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        Self::new(goos, goarch)
    }

    /// Applies the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name rules.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = match file_name.find('.') {
            Some(dot) => &file_name[..dot],
            None => file_name,
        };
        let Some(first_underscore) = stem.find('_') else {
            return true;
        };

        let mut parts: Vec<&str> = stem[first_underscore..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }

        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_os(parts[n - 2]) && parts[n - 1] == self.goarch;
        }
        if n >= 1 {
            if KNOWN_OS.contains(&parts[n - 1]) {
                return self.matches_os(parts[n - 1]);
            }
            if KNOWN_ARCH.contains(&parts[n - 1]) {
                return parts[n - 1] == self.goarch;
            }
        }
        true
    }

    fn matches_os(&self, os: &str) -> bool {
        if os == self.goos {
            return true;
        }
        matches!(
            (os, self.goos.as_str()),
            ("linux", "android") | ("solaris", "illumos") | ("darwin", "ios")
        )
    }
}

pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.ends_with("_test.go"))
}

/// `.go` files that the toolchain would consider at all.
pub fn is_candidate_file(path: &Path, target: &BuildTarget) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.starts_with('_')
        && !name.starts_with('.')
        && target.matches_file_name(name)
}
