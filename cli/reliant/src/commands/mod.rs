//! CLI command implementations.

pub mod analyze;
pub mod expression;
pub mod init;
pub mod models;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use reliant_analysis::Configuration;
use reliant_graph::{DependencyGraph, DiagramTransformer, NodeId, SequenceDiagram};

/// Resolve an input file: a command-line path is taken as given, a
/// manifest path is relative to the project directory.
pub(crate) fn resolve_input(
    project_dir: &Path,
    flag: Option<&str>,
    from_manifest: Option<&str>,
    what: &str,
) -> Result<PathBuf> {
    match (flag, from_manifest) {
        (Some(path), _) => Ok(PathBuf::from(path)),
        (None, Some(path)) => Ok(project_dir.join(path)),
        (None, None) => bail!(
            "no {what} given. Pass --{what} or set it in the [analysis] section of reliant.toml"
        ),
    }
}

/// Load a sequence diagram from a JSON file.
pub(crate) fn load_diagram(path: &Path) -> Result<SequenceDiagram> {
    if !path.is_file() {
        bail!("diagram file not found: {}", path.display());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Transform a diagram into a fresh dependency graph, returning the graph
/// and the id of the top-level node.
pub(crate) fn build_graph(diagram: &SequenceDiagram) -> Result<(DependencyGraph, NodeId)> {
    let mut graph = DependencyGraph::new();
    let root = DiagramTransformer::new()
        .transform(&mut graph, diagram)
        .with_context(|| format!("transforming diagram '{}'", diagram.name))?;
    debug!(nodes = graph.len(), %root, "dependency graph built");
    Ok((graph, root))
}

/// Pick the root node: flag, then manifest, then the top-level diagram.
pub(crate) fn resolve_root(
    graph: &DependencyGraph,
    flag: Option<&str>,
    from_manifest: Option<&str>,
    top_level: &str,
) -> Result<NodeId> {
    let root = flag.or(from_manifest).unwrap_or(top_level);
    if !graph.contains(root) {
        let known: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        bail!("unknown root node '{root}'. Known nodes: {}", known.join(", "));
    }
    Ok(root.to_string())
}

/// Read a configuration list, one configuration per line.
pub(crate) fn load_configurations(path: &Path) -> Result<Vec<Configuration>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let configurations = Configuration::parse_list(&content);
    if configurations.is_empty() {
        warn!(path = %path.display(), "configuration list is empty");
    }
    Ok(configurations)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use reliant_graph::SequenceDiagram;

    /// A sensor network with two optional sensors.
    pub fn bsn() -> SequenceDiagram {
        SequenceDiagram::new("BSN")
            .message("start", 0.9)
            .optional(
                SequenceDiagram::new("Oxygen")
                    .with_guard("SPO2")
                    .message("read", 0.8),
            )
            .optional(
                SequenceDiagram::new("Temp")
                    .with_guard("TEMP")
                    .message("read", 0.5),
            )
    }

    pub fn write_bsn(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("bsn.json");
        std::fs::write(&path, serde_json::to_string_pretty(&bsn()).unwrap()).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_paths_win_over_manifest_paths() {
        let project = Path::new("/project");
        assert_eq!(
            resolve_input(project, Some("x.json"), Some("y.json"), "diagram").unwrap(),
            PathBuf::from("x.json")
        );
        assert_eq!(
            resolve_input(project, None, Some("y.json"), "diagram").unwrap(),
            project.join("y.json")
        );
        let err = resolve_input(project, None, None, "diagram").unwrap_err();
        assert!(err.to_string().contains("--diagram"));
    }

    #[test]
    fn loads_diagram_and_resolves_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_bsn(dir.path());
        let diagram = load_diagram(&path).unwrap();
        let (graph, top) = build_graph(&diagram).unwrap();
        assert_eq!(top, "BSN");
        assert_eq!(graph.len(), 3);
        assert_eq!(resolve_root(&graph, None, None, &top).unwrap(), "BSN");
        assert_eq!(resolve_root(&graph, Some("Temp"), Some("BSN"), &top).unwrap(), "Temp");
        assert!(resolve_root(&graph, None, Some("Nope"), &top).is_err());
    }

    #[test]
    fn missing_and_malformed_diagrams_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_diagram(&dir.path().join("none.json"))
            .unwrap_err()
            .to_string()
            .contains("not found"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ \"name\": 3 }").unwrap();
        assert!(format!("{:#}", load_diagram(&bad).unwrap_err()).contains("parsing"));
    }

    #[test]
    fn reads_configuration_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configurations.txt");
        std::fs::write(&path, "# products\n-\nSPO2\nSPO2, TEMP\n\n").unwrap();
        let configurations = load_configurations(&path).unwrap();
        assert_eq!(configurations.len(), 3);
        assert!(configurations[0].is_empty());
        assert_eq!(configurations[2].len(), 2);
    }
}
