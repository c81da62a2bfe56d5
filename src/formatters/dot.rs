use anyhow::Result;
use petgraph::visit::EdgeRef;
use std::fmt::Write;

use super::GraphFormatter;
use crate::core::DependencyGraph;

/// GraphViz output. Node ids follow node insertion order, so the same graph
/// always renders the same text.
pub struct DotFormatter;

impl DotFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl GraphFormatter for DotFormatter {
    fn format_graph(&self, graph: &DependencyGraph) -> Result<String> {
        let mut out = String::from("digraph {\n");

        for index in graph.node_indices() {
            writeln!(
                out,
                "  {} [label=\"{}\"]",
                index.index(),
                escape_label(&graph[index].name)
            )?;
        }
        for edge in graph.edge_references() {
            writeln!(
                out,
                "  {} -> {};",
                edge.source().index(),
                edge.target().index()
            )?;
        }

        out.push('}');
        Ok(out)
    }
}

impl Default for DotFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
