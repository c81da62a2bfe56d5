use anyhow::Result;

use super::GraphFormatter;
use crate::core::{graph::node_names, DependencyGraph};

/// A JSON array of every node name, sorted and unique.
pub struct ListFormatter;

impl ListFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl GraphFormatter for ListFormatter {
    fn format_graph(&self, graph: &DependencyGraph) -> Result<String> {
        Ok(serde_json::to_string(&node_names(graph))?)
    }
}

impl Default for ListFormatter {
    fn default() -> Self {
        Self::new()
    }
}
