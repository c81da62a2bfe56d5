use deptree::core::{DependencyGraph, GraphBuilder, Package};
use deptree::formatters::{
    write_unresolved, DotFormatter, GraphFormatter, JsonGraphFormatter, ListFormatter,
};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

fn pkg(name: &str, deps: Vec<Arc<Package>>) -> Arc<Package> {
    let mut package = Package::new(name);
    package.canonical_path = name.to_string();
    package.directory = PathBuf::from("/src").join(name);
    package.is_resolved = true;
    package.dependencies = deps;
    Arc::new(package)
}

fn sample() -> DependencyGraph {
    let c = pkg("c", vec![]);
    let b = pkg("b", vec![c.clone()]);
    let a = pkg("a", vec![b, c]);
    GraphBuilder::assemble(&[a])
}

#[test]
fn json_graph_matches_graphlib_layout() {
    let graph = sample();
    let text = JsonGraphFormatter::new().format_graph(&graph).unwrap();
    let v: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(
        v["options"],
        json!({"directed": true, "multigraph": false, "compound": false})
    );
    assert_eq!(
        v["edges"],
        json!([
            {"v": "b", "w": "c"},
            {"v": "a", "w": "b"},
            {"v": "a", "w": "c"}
        ])
    );

    let first = &v["nodes"][0];
    assert_eq!(first["v"], "a");
    assert_eq!(
        first["value"],
        json!({
            "requestedName": "a",
            "canonicalPath": "a",
            "directory": "/src/a",
            "isBuiltin": false,
            "isResolved": true,
            "dependencies": ["b", "c"]
        })
    );
    assert_eq!(v["nodes"].as_array().unwrap().len(), 3);
}

#[test]
fn dot_output_is_stable() {
    let graph = sample();
    let formatter = DotFormatter::new();
    let first = formatter.format_graph(&graph).unwrap();
    let second = formatter.format_graph(&graph).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        "digraph {\n  0 [label=\"a\"]\n  1 [label=\"b\"]\n  2 [label=\"c\"]\n  1 -> 2;\n  0 -> 1;\n  0 -> 2;\n}"
    );
}

#[test]
fn list_output_is_a_sorted_array() {
    let d = pkg("d", vec![]);
    let graph = GraphBuilder::assemble(&[pkg("z", vec![d.clone()]), pkg("m", vec![d])]);
    let text = ListFormatter::new().format_graph(&graph).unwrap();
    assert_eq!(text, r#"["d","m","z"]"#);
}

#[test]
fn formatters_write_files() {
    let graph = sample();
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("graph.dot");

    DotFormatter::new().format_to_file(&graph, &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("digraph {"));

    let mut buffer = Vec::new();
    ListFormatter::new()
        .format_to_writer(&graph, &mut buffer)
        .unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), "[\"a\",\"b\",\"c\"]\n");
}

#[test]
fn unresolved_names_are_listed_bare_and_sorted() {
    let unresolved: BTreeSet<String> = ["zeta/pkg", "alpha/pkg"]
        .into_iter()
        .map(String::from)
        .collect();

    let mut out = Vec::new();
    write_unresolved(&unresolved, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Unresolved packages:\nalpha/pkg\nzeta/pkg\n"
    );

    let mut empty = Vec::new();
    write_unresolved(&BTreeSet::new(), &mut empty).unwrap();
    assert!(empty.is_empty());
}
