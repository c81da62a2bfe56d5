pub mod dot;
pub mod json_graph;
pub mod list;

pub use dot::DotFormatter;
pub use json_graph::JsonGraphFormatter;
pub use list::ListFormatter;

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::DependencyGraph;

/// Renders a dependency graph into a text document.
pub trait GraphFormatter {
    fn format_graph(&self, graph: &DependencyGraph) -> Result<String>;

    fn format_to_file(&self, graph: &DependencyGraph, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.format_graph(graph)?)?;
        Ok(())
    }

    fn format_to_writer(&self, graph: &DependencyGraph, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(self.format_graph(graph)?.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Lists unresolved import names under a heading, one per line, in sorted
/// order. Writes nothing when the set is empty.
pub fn write_unresolved(unresolved: &BTreeSet<String>, writer: &mut dyn Write) -> Result<()> {
    if unresolved.is_empty() {
        return Ok(());
    }
    writeln!(writer, "Unresolved packages:")?;
    for name in unresolved {
        writeln!(writer, "{name}")?;
    }
    Ok(())
}
