use anyhow::Result;
use serde_json::{json, Value};

use super::GraphFormatter;
use crate::core::DependencyGraph;

/// Graph JSON in the `{nodes, edges, options}` layout understood by graphlib.
pub struct JsonGraphFormatter {
    pretty: bool,
}

impl JsonGraphFormatter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn to_value(&self, graph: &DependencyGraph) -> Result<Value> {
        let nodes = graph
            .node_weights()
            .map(|node| -> Result<Value> {
                Ok(json!({
                    "v": node.name,
                    "value": serde_json::to_value(&*node.package)?,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        let edges: Vec<Value> = graph
            .raw_edges()
            .iter()
            .map(|edge| {
                json!({
                    "v": graph[edge.source()].name,
                    "w": graph[edge.target()].name,
                })
            })
            .collect();

        Ok(json!({
            "nodes": nodes,
            "edges": edges,
            "options": {
                "directed": true,
                "multigraph": false,
                "compound": false,
            },
        }))
    }
}

impl GraphFormatter for JsonGraphFormatter {
    fn format_graph(&self, graph: &DependencyGraph) -> Result<String> {
        let value = self.to_value(graph)?;
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }
}

impl Default for JsonGraphFormatter {
    fn default() -> Self {
        Self::new()
    }
}
