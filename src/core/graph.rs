use petgraph::{graph::NodeIndex, Directed, Graph};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::package::Package;

/// A graph node: a package keyed by its canonical name.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub package: Arc<Package>,
}

/// Import edges carry no payload.
pub type DependencyGraph = Graph<Node, (), Directed>;

/// Flattens a forest of resolved packages into one graph with unique node
/// names and unique edges.
pub struct GraphBuilder {
    graph: DependencyGraph,
    node_map: HashMap<String, NodeIndex>,
    edge_set: HashSet<(NodeIndex, NodeIndex)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
            edge_set: HashSet::new(),
        }
    }

    pub fn assemble(roots: &[Arc<Package>]) -> DependencyGraph {
        let mut builder = Self::new();
        for root in roots {
            builder.add_tree(root);
        }
        builder.build()
    }

    /// Adds `package` and, on its first visit, everything below it.
    ///
    /// An edge is recorded for every parent/child pair even when the child was
    /// already expanded elsewhere; only the descent is pruned.
    pub fn add_tree(&mut self, package: &Arc<Package>) -> NodeIndex {
        if let Some(&index) = self.node_map.get(package.name()) {
            // A located-only copy (cycle break, depth limit) may have been
            // seen first; the expanded copy still contributes its edges.
            let known = &self.graph[index].package;
            if known.dependencies.is_empty() && !package.dependencies.is_empty() {
                self.graph[index].package = Arc::clone(package);
                self.add_children(index, package);
            }
            return index;
        }

        let index = self.graph.add_node(Node {
            name: package.name().to_string(),
            package: Arc::clone(package),
        });
        self.node_map.insert(package.name().to_string(), index);
        self.add_children(index, package);
        index
    }

    fn add_children(&mut self, index: NodeIndex, package: &Arc<Package>) {
        for dep in &package.dependencies {
            let child = self.add_tree(dep);
            self.add_edge(index, child);
        }
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if !self.edge_set.insert((from, to)) {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    pub fn build(self) -> DependencyGraph {
        self.graph
    }

    pub fn get_node_index(&self, name: &str) -> Option<NodeIndex> {
        self.node_map.get(name).copied()
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted, duplicate-free node names.
pub fn node_names(graph: &DependencyGraph) -> Vec<String> {
    let mut names: Vec<String> = graph
        .node_weights()
        .map(|node| node.name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Every edge as a `(from, to)` name pair, sorted.
pub fn edge_names(graph: &DependencyGraph) -> Vec<(String, String)> {
    let mut edges: Vec<(String, String)> = graph
        .raw_edges()
        .iter()
        .map(|edge| {
            (
                graph[edge.source()].name.clone(),
                graph[edge.target()].name.clone(),
            )
        })
        .collect();
    edges.sort();
    edges
}
