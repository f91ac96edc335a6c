//! `reliant.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use reliant_analysis::{ConcurrencyStrategy, StrategyKind};

pub const MANIFEST_FILE: &str = "reliant.toml";

/// The top-level manifest structure for a reliability analysis project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliantManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Analysis defaults.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Analysis section. Every field can be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Diagram file, relative to the project directory.
    #[serde(default)]
    pub diagram: Option<String>,
    /// Configuration list, relative to the project directory.
    #[serde(default)]
    pub configurations: Option<String>,
    /// Root node id. Defaults to the name of the top-level diagram.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub strategy: Option<StrategyKind>,
    #[serde(default)]
    pub concurrency: Option<ConcurrencyStrategy>,
    /// Feature universe; configurations enabling anything else fail.
    #[serde(default)]
    pub features: Option<Vec<String>>,
    /// Boolean formula over features; configurations violating it score 0.
    #[serde(default)]
    pub feature_model: Option<String>,
}

/// Output section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where to write the dependency graph as Graphviz text.
    #[serde(default)]
    pub dot: Option<String>,
}

impl ReliantManifest {
    /// Search upward from `start_dir` for a `reliant.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: ReliantManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing reliant.toml")
    }

    /// Generate the default template for `reliant init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"

[analysis]
diagram = "diagram.json"
configurations = "configurations.txt"
strategy = "family"
concurrency = "parallel"
# root = "Sensor"
# features = ["A", "B"]
# feature_model = "A || B"

[output]
# dot = "rdg.dot"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[project]
name = "bsn"
description = "Body sensor network"

[analysis]
diagram = "bsn.json"
configurations = "products.txt"
root = "BSN"
strategy = "feature"
concurrency = "sequential"
features = ["SPO2", "TEMP"]
feature_model = "SPO2 || TEMP"

[output]
dot = "rdg.dot"
"#;
        let manifest = ReliantManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.project.name, "bsn");
        assert_eq!(manifest.analysis.root.as_deref(), Some("BSN"));
        assert_eq!(manifest.analysis.strategy, Some(StrategyKind::Feature));
        assert_eq!(
            manifest.analysis.concurrency,
            Some(ConcurrencyStrategy::Sequential)
        );
        assert_eq!(manifest.analysis.features.as_ref().map(Vec::len), Some(2));
        assert_eq!(manifest.output.dot.as_deref(), Some("rdg.dot"));
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = ReliantManifest::from_str("[project]\nname = \"minimal\"\n").unwrap();
        assert_eq!(manifest.project.name, "minimal");
        assert!(manifest.analysis.strategy.is_none());
        assert!(manifest.analysis.diagram.is_none());
        assert!(manifest.output.dot.is_none());
    }

    #[test]
    fn reject_unknown_strategy() {
        let toml_str = "[project]\nname = \"x\"\n[analysis]\nstrategy = \"guess\"\n";
        assert!(ReliantManifest::from_str(toml_str).is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let manifest = ReliantManifest::from_str(&ReliantManifest::template("demo")).unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.analysis.strategy, Some(StrategyKind::Family));
        assert_eq!(manifest.analysis.diagram.as_deref(), Some("diagram.json"));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[project]\nname = \"parent\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = ReliantManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "parent");
        assert_eq!(found_dir, dir.path());
    }

    #[test]
    fn find_and_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "not toml [[[").unwrap();
        let err = ReliantManifest::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
