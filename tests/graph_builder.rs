use deptree::core::graph::{edge_names, node_names};
use deptree::core::{DependencyGraph, GraphBuilder, Package};
use std::sync::Arc;

fn pkg(name: &str, deps: Vec<Arc<Package>>) -> Arc<Package> {
    let mut package = Package::new(name);
    package.canonical_path = name.to_string();
    package.is_resolved = true;
    package.dependencies = deps;
    Arc::new(package)
}

fn edge(from: &str, to: &str) -> (String, String) {
    (from.to_string(), to.to_string())
}

#[test]
fn graph_builder_dedupes_nodes_and_edges() {
    let d = pkg("d", vec![]);
    let b = pkg("b", vec![d.clone()]);
    let c = pkg("c", vec![d.clone()]);
    let a = pkg("a", vec![b.clone(), c.clone()]);

    let graph: DependencyGraph = GraphBuilder::assemble(&[a.clone(), b, a]);
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(
        edge_names(&graph),
        vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")]
    );
}

#[test]
fn revisited_child_still_gets_an_edge_from_each_parent() {
    // x is fully expanded under r1; r2 reaches it through z.
    let y = pkg("y", vec![]);
    let x = pkg("x", vec![y]);
    let r1 = pkg("r1", vec![x.clone()]);
    let z = pkg("z", vec![x]);
    let r2 = pkg("r2", vec![z]);

    let graph = GraphBuilder::assemble(&[r1, r2]);
    assert_eq!(
        edge_names(&graph),
        vec![
            edge("r1", "x"),
            edge("r2", "z"),
            edge("x", "y"),
            edge("z", "x")
        ]
    );
}

#[test]
fn expanded_copy_seen_after_located_copy_keeps_its_edges() {
    // r1 only holds a located-only copy of x; r2 holds the expanded one.
    let located_x = pkg("x", vec![]);
    let r1 = pkg("r1", vec![located_x]);
    let w = pkg("w", vec![]);
    let expanded_x = pkg("x", vec![w]);
    let r2 = pkg("r2", vec![expanded_x.clone()]);

    let graph = GraphBuilder::assemble(&[r1, r2]);
    assert_eq!(node_names(&graph), vec!["r1", "r2", "w", "x"]);
    assert!(edge_names(&graph).contains(&edge("x", "w")));
    assert!(edge_names(&graph).contains(&edge("r1", "x")));

    let x = graph.node_indices().find(|&i| graph[i].name == "x").unwrap();
    assert!(Arc::ptr_eq(&graph[x].package, &expanded_x));
}

#[test]
fn residual_cycles_in_the_forest_terminate() {
    // b -> a is a located-only back reference, a's full copy is the root.
    let back = pkg("a", vec![]);
    let b = pkg("b", vec![back]);
    let a = pkg("a", vec![b]);

    let graph = GraphBuilder::assemble(&[a]);
    assert_eq!(node_names(&graph), vec!["a", "b"]);
    assert_eq!(edge_names(&graph), vec![edge("a", "b"), edge("b", "a")]);
}

#[test]
fn add_edge_rejects_duplicates() {
    let mut gb = GraphBuilder::new();
    let a = gb.add_tree(&pkg("a", vec![]));
    let b = gb.add_tree(&pkg("b", vec![]));

    assert!(gb.add_edge(a, b));
    assert!(!gb.add_edge(a, b));
    assert_eq!(gb.get_node_index("b"), Some(b));
    assert_eq!(gb.build().edge_count(), 1);
}
