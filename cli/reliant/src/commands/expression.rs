//! `reliant expression`: the family expression of a root node.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use reliant_analysis::{FamilyExpression, ReliabilityAnalyzer};
use reliant_model::AcyclicModelChecker;

use crate::commands::{build_graph, load_diagram, resolve_input, resolve_root};
use crate::manifest::ReliantManifest;

pub fn run(
    project_dir: &Path,
    manifest: Option<&ReliantManifest>,
    diagram: Option<&str>,
    root: Option<&str>,
) -> Result<()> {
    let settings = manifest.map(|m| &m.analysis);
    let path = resolve_input(
        project_dir,
        diagram,
        settings.and_then(|s| s.diagram.as_deref()),
        "diagram",
    )?;
    let (graph, top_level) = build_graph(&load_diagram(&path)?)?;
    let root = resolve_root(
        &graph,
        root,
        settings.and_then(|s| s.root.as_deref()),
        &top_level,
    )?;

    let family = ReliabilityAnalyzer::new(AcyclicModelChecker::new())
        .family_expression(&graph, &root)
        .with_context(|| format!("deriving the expression of '{root}'"))?;
    print!("{}", render(&root, &family));
    Ok(())
}

/// The expression followed by its presence classes.
pub fn render(root: &str, family: &FamilyExpression) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{root} = {}", family.formula());
    if !family.classes().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Presence classes:");
        for (symbol, condition) in family.classes().iter() {
            let _ = writeln!(out, "  {symbol} = {condition}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn renders_formula_and_classes() {
        let (graph, root) = build_graph(&fixtures::bsn()).unwrap();
        let family = ReliabilityAnalyzer::new(AcyclicModelChecker::new())
            .family_expression(&graph, &root)
            .unwrap();
        let text = render(&root, &family);
        assert!(text.starts_with("BSN = "));
        assert!(text.contains("Presence classes:\n"));
        assert!(text.contains(" = SPO2\n"));
        assert!(text.contains(" = TEMP\n"));
        assert!(text.contains("  _pc0 = "));
    }

    #[test]
    fn expression_without_classes_is_a_single_line() {
        let mut graph = reliant_graph::DependencyGraph::new();
        reliant_graph::DiagramTransformer::new()
            .transform(&mut graph, &reliant_graph::SequenceDiagram::new("Solo").message("m", 0.5))
            .unwrap();
        let family = ReliabilityAnalyzer::new(AcyclicModelChecker::new())
            .family_expression(&graph, "Solo")
            .unwrap();
        let text = render("Solo", &family);
        assert!(text.starts_with("Solo = "));
        assert_eq!(text.lines().count(), 1);
    }
}
