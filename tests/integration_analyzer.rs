use deptree::core::graph::{edge_names, node_names};
use deptree::core::package::parse_ignore_list;
use deptree::core::{
    DependencyAnalyzer, GoEnv, GoLocator, PackageScanner, ResolveError, ResolveOptions,
};
use deptree::formatters::{GraphFormatter, ListFormatter};
use deptree::parsers::go::BuildTarget;
use std::fs;
use std::path::{Path, PathBuf};

fn write<P: AsRef<Path>>(path: P, contents: &str) {
    let path = path.as_ref();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn edge(from: &str, to: &str) -> (String, String) {
    (from.to_string(), to.to_string())
}

/// A small GOPATH project:
///
/// app -> lib -> internal/util -> model, app -> (missing), app -> cli
fn project() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::TempDir::new().unwrap();
    let gopath = dir.path().canonicalize().unwrap();
    let app = gopath.join("src/example.com/app");

    write(
        app.join("main.go"),
        r#"package main

import (
	"fmt"

	"example.com/app/cli"
	"example.com/app/lib"
	"example.com/missing/pkg"
)

func main() { fmt.Println(lib.X, cli.Y, pkg.Z) }
"#,
    );
    write(
        app.join("lib/lib.go"),
        "package lib\n\nimport (\n\t\"strings\"\n\t\"example.com/app/internal/util\"\n)\n",
    );
    write(
        app.join("internal/util/util.go"),
        "package util\n\nimport \"example.com/app/model\"\n",
    );
    write(app.join("model/model.go"), "package model\n\nimport \"C\"\n");
    write(
        app.join("cli/cli.go"),
        "package cli\n\nimport \"example.com/app/lib\"\n",
    );
    write(app.join("tools/gen/gen.go"), "package main\n\nimport \"os\"\n");
    write(
        app.join("testdata/fixture.go"),
        "package fixture\n\nimport \"example.com/app/never\"\n",
    );
    write(app.join("_attic/old.go"), "package old\n");

    (dir, gopath, app)
}

fn locator(gopath: &Path) -> GoLocator {
    let env = GoEnv::new()
        .with_gopath(gopath)
        .with_target(BuildTarget::new("linux", "amd64"));
    GoLocator::new(env).unwrap()
}

#[test]
fn resolve_tree_builds_the_whole_graph() {
    let (_dir, gopath, app) = project();
    let locator = locator(&gopath);

    let report = DependencyAnalyzer::new(&locator).resolve_tree(&app).unwrap();

    let names = node_names(&report.graph);
    assert_eq!(
        names,
        vec![
            "example.com/app",
            "example.com/app/cli",
            "example.com/app/lib",
            "example.com/app/model",
            "example.com/app/tools/gen",
            "example.com/missing/pkg",
        ]
    );
    assert!(names.iter().all(|n| !n.contains("internal")));

    let edges = edge_names(&report.graph);
    assert!(edges.contains(&edge("example.com/app", "example.com/app/lib")));
    assert!(edges.contains(&edge("example.com/app", "example.com/app/cli")));
    assert!(edges.contains(&edge("example.com/app/cli", "example.com/app/lib")));
    assert!(edges.contains(&edge("example.com/app/lib", "example.com/app/model")));
    assert_eq!(
        report.unresolved.iter().collect::<Vec<_>>(),
        vec!["example.com/missing/pkg"]
    );
    assert!(!report.is_complete());

    // The virtual root comes first; sub-roots reuse memoized packages, so
    // only tools/gen is read on top of the virtual root's subtree.
    assert_eq!(report.roots[0].canonical_path, "example.com/app");
    assert_eq!(locator.directories_read(), 6);
}

#[test]
fn standard_packages_appear_as_leaves_on_request() {
    let (_dir, gopath, app) = project();
    let locator = locator(&gopath);

    let options = ResolveOptions {
        include_builtin: true,
        ..ResolveOptions::default()
    };
    let report = DependencyAnalyzer::new(&locator)
        .with_options(options)
        .resolve_tree(&app)
        .unwrap();

    let graph = &report.graph;
    for std_name in ["fmt", "strings", "os"] {
        let index = graph
            .node_indices()
            .find(|&i| graph[i].name == std_name)
            .unwrap_or_else(|| panic!("{std_name} missing"));
        assert!(graph[index].package.is_builtin);
        assert_eq!(graph.neighbors(index).count(), 0);
    }

    let root = &report.roots[0];
    assert_eq!(
        root.dependency_names(),
        vec![
            "fmt",
            "example.com/app/cli",
            "example.com/app/lib",
            "example.com/missing/pkg"
        ]
    );
}

#[test]
fn ignore_patterns_remove_imports_and_sub_roots() {
    let (_dir, gopath, app) = project();
    let locator = locator(&gopath);

    let report = DependencyAnalyzer::new(&locator)
        .with_ignore_patterns(parse_ignore_list("example.com/missing*,example.com/app/tools*"))
        .resolve_tree(&app)
        .unwrap();

    let names = node_names(&report.graph);
    assert!(!names.iter().any(|n| n.starts_with("example.com/missing")));
    assert!(!names.iter().any(|n| n.starts_with("example.com/app/tools")));
    assert!(report.is_complete());
}

#[test]
fn list_output_is_sorted_and_unique() {
    let (_dir, gopath, app) = project();
    let locator = locator(&gopath);
    let report = DependencyAnalyzer::new(&locator).resolve_tree(&app).unwrap();

    let text = ListFormatter::new().format_graph(&report.graph).unwrap();
    let listed: Vec<String> = serde_json::from_str(&text).unwrap();

    let mut expected = listed.clone();
    expected.sort();
    expected.dedup();
    assert_eq!(listed, expected);
    assert_eq!(listed.len(), report.graph.node_count());
}

#[test]
fn cyclic_packages_on_disk_terminate() {
    let dir = tempfile::TempDir::new().unwrap();
    let gopath = dir.path().canonicalize().unwrap();
    let base = gopath.join("src/cyc");
    write(base.join("a/a.go"), "package a\n\nimport \"cyc/b\"\n");
    write(base.join("b/b.go"), "package b\n\nimport \"cyc/c\"\n");
    write(base.join("c/c.go"), "package c\n\nimport \"cyc/a\"\n");

    let locator = locator(&gopath);
    let report = DependencyAnalyzer::new(&locator).resolve_tree(&base).unwrap();

    assert_eq!(node_names(&report.graph), vec!["cyc/a", "cyc/b", "cyc/c"]);
    let edges = edge_names(&report.graph);
    assert!(edges.contains(&edge("cyc/a", "cyc/b")));
    assert!(edges.contains(&edge("cyc/b", "cyc/c")));
    assert!(edges.contains(&edge("cyc/c", "cyc/a")));
    assert!(report.is_complete());
}

#[test]
fn missing_root_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let locator = locator(dir.path());

    let err = DependencyAnalyzer::new(&locator)
        .resolve_tree(&dir.path().join("does-not-exist"))
        .unwrap_err();
    assert!(matches!(err, ResolveError::RootPath { .. }));
}

#[test]
fn test_imports_expand_only_for_roots() {
    let dir = tempfile::TempDir::new().unwrap();
    let gopath = dir.path().canonicalize().unwrap();
    let base = gopath.join("src/proj");
    write(base.join("a.go"), "package proj\n");
    write(
        base.join("a_test.go"),
        "package proj\n\nimport \"proj/testutil\"\n",
    );
    write(base.join("testutil/util.go"), "package testutil\n");

    let locator = locator(&gopath);
    let without = DependencyAnalyzer::new(&locator).resolve_tree(&base).unwrap();
    assert!(!edge_names(&without.graph).contains(&edge("proj", "proj/testutil")));

    let options = ResolveOptions {
        include_tests: true,
        ..ResolveOptions::default()
    };
    let with = DependencyAnalyzer::new(&locator)
        .with_options(options)
        .resolve_tree(&base)
        .unwrap();
    assert!(edge_names(&with.graph).contains(&edge("proj", "proj/testutil")));
}

#[test]
fn relative_import_cycle_terminates() {
    let dir = tempfile::TempDir::new().unwrap();
    let base = dir.path().canonicalize().unwrap().join("work");
    write(base.join("a/a.go"), "package a\n\nimport \"../b\"\n");
    write(base.join("b/b.go"), "package b\n\nimport \"../a\"\n");

    let locator = locator(&dir.path().join("gopath"));
    let report = DependencyAnalyzer::new(&locator)
        .resolve_tree(&base.join("a"))
        .unwrap();

    let a = format!("_{}", base.join("a").display());
    let b = format!("_{}", base.join("b").display());
    assert_eq!(node_names(&report.graph), vec![a.clone(), b.clone()]);
    assert_eq!(edge_names(&report.graph), vec![edge(&a, &b), edge(&b, &a)]);
    assert_eq!(locator.directories_read(), 2);
    assert!(report.is_complete());
}

#[test]
fn missing_dotless_import_is_unresolved() {
    let dir = tempfile::TempDir::new().unwrap();
    let gopath = dir.path().canonicalize().unwrap();
    let app = gopath.join("src/app");
    write(
        app.join("main.go"),
        "package main\n\nimport (\n\t\"fmt\"\n\t\"nonexistent/pkg\"\n)\n",
    );

    let locator = locator(&gopath);
    let report = DependencyAnalyzer::new(&locator).resolve_tree(&app).unwrap();

    assert_eq!(
        report.unresolved.iter().collect::<Vec<_>>(),
        vec!["nonexistent/pkg"]
    );
    assert!(!report.is_complete());
    assert_eq!(node_names(&report.graph), vec!["app", "nonexistent/pkg"]);
}

#[test]
fn walk_depth_limits_sub_roots_only() {
    let (_dir, gopath, app) = project();
    let locator = locator(&gopath);

    let report = DependencyAnalyzer::new(&locator)
        .with_scanner(PackageScanner::new().with_max_depth(1))
        .resolve_tree(&app)
        .unwrap();

    // tools/gen sits two levels down and is imported by nobody.
    let names = node_names(&report.graph);
    assert!(!names.contains(&"example.com/app/tools/gen".to_string()));
    assert!(names.contains(&"example.com/app/model".to_string()));
}
