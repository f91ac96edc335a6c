//! `reliant models`: print the state model of every dependency graph node.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Result};
use reliant_graph::DependencyGraph;

use crate::commands::{build_graph, load_diagram, resolve_input};
use crate::manifest::ReliantManifest;

/// Print every node's model, in the order the nodes were built.
pub fn run(
    project_dir: &Path,
    manifest: Option<&ReliantManifest>,
    diagram: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let path = resolve_input(
        project_dir,
        diagram,
        manifest.and_then(|m| m.analysis.diagram.as_deref()),
        "diagram",
    )?;
    let (graph, _) = build_graph(&load_diagram(&path)?)?;
    match format {
        Some("text") | None => print!("{}", render_text(&graph)),
        Some("dot") => print!("{}", render_dot(&graph)),
        Some(other) => bail!("unknown model format: '{other}'. Choose: text, dot"),
    }
    Ok(())
}

pub fn render_text(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for node in graph.nodes() {
        let _ = writeln!(out, "# {} [{}]", node.id, node.presence_condition);
        if !node.dependencies.is_empty() {
            let _ = writeln!(out, "# depends on: {}", node.dependencies.join(", "));
        }
        let _ = writeln!(out, "{}", node.model);
    }
    out
}

pub fn render_dot(graph: &DependencyGraph) -> String {
    graph
        .nodes()
        .map(|node| node.model.to_dot())
        .collect::<Vec<_>>()
        .join("\n")
}
