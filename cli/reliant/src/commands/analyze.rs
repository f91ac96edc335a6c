//! `reliant analyze`: reliability of every configuration in a list.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use reliant_analysis::{
    AnalysisResults, ConcurrencyStrategy, FeatureModelPruning, ReliabilityAnalyzer, StrategyKind,
};
use reliant_graph::NodeId;
use reliant_model::AcyclicModelChecker;

use crate::commands::{build_graph, load_configurations, load_diagram, resolve_input, resolve_root};
use crate::manifest::ReliantManifest;

/// Command-line arguments of `reliant analyze`.
#[derive(Debug, Default)]
pub struct AnalyzeArgs<'a> {
    pub diagram: Option<&'a str>,
    pub configurations: Option<&'a str>,
    pub strategy: Option<&'a str>,
    pub sequential: bool,
    pub root: Option<&'a str>,
    pub report: Option<&'a str>,
    pub dot: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Human,
    Json,
}

/// A finished analysis, ready to be reported.
#[derive(Debug)]
pub struct Analysis {
    pub root: NodeId,
    pub strategy: StrategyKind,
    pub concurrency: ConcurrencyStrategy,
    pub results: AnalysisResults,
}

/// Run the analysis and print the report.
pub fn run(
    project_dir: &Path,
    manifest: Option<&ReliantManifest>,
    args: &AnalyzeArgs<'_>,
) -> Result<()> {
    let format = resolve_report(args.report)?;
    let analysis = analyze(project_dir, manifest, args)?;

    match format {
        ReportFormat::Human => print!("{}", render_human(&analysis)),
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&render_json(&analysis))?)
        }
    }

    let failed = analysis.results.failures().count();
    if failed > 0 {
        bail!("{failed} configuration(s) could not be evaluated");
    }
    Ok(())
}

/// Load inputs, build the dependency graph and evaluate every configuration.
///
/// Command-line arguments take precedence over the manifest, which takes
/// precedence over the built-in defaults.
pub fn analyze(
    project_dir: &Path,
    manifest: Option<&ReliantManifest>,
    args: &AnalyzeArgs<'_>,
) -> Result<Analysis> {
    let settings = manifest.map(|m| &m.analysis);

    let diagram_path = resolve_input(
        project_dir,
        args.diagram,
        settings.and_then(|s| s.diagram.as_deref()),
        "diagram",
    )?;
    let configurations_path = resolve_input(
        project_dir,
        args.configurations,
        settings.and_then(|s| s.configurations.as_deref()),
        "configurations",
    )?;

    let diagram = load_diagram(&diagram_path)?;
    let (graph, top_level) = build_graph(&diagram)?;
    let root = resolve_root(
        &graph,
        args.root,
        settings.and_then(|s| s.root.as_deref()),
        &top_level,
    )?;

    let dot_path = match (args.dot, manifest.and_then(|m| m.output.dot.as_deref())) {
        (Some(path), _) => Some(Path::new(path).to_path_buf()),
        (None, Some(path)) => Some(project_dir.join(path)),
        (None, None) => None,
    };
    if let Some(path) = dot_path {
        fs::write(&path, graph.to_dot()).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "dependency graph written");
    }

    let strategy = match args.strategy {
        Some(name) => name.parse::<StrategyKind>()?,
        None => settings.and_then(|s| s.strategy).unwrap_or_default(),
    };
    let concurrency = if args.sequential {
        ConcurrencyStrategy::Sequential
    } else {
        settings.and_then(|s| s.concurrency).unwrap_or_default()
    };

    let mut analyzer = ReliabilityAnalyzer::new(AcyclicModelChecker::new())
        .with_strategy_kind(strategy)
        .with_concurrency(concurrency);
    if let Some(features) = settings.and_then(|s| s.features.as_ref()) {
        analyzer = analyzer.with_feature_universe(features.iter().cloned());
    }
    if let Some(feature_model) = settings.and_then(|s| s.feature_model.as_deref()) {
        analyzer = analyzer.with_pruning(FeatureModelPruning::new(feature_model)?);
    }

    let configurations = load_configurations(&configurations_path)?;
    let results = analyzer
        .analyze(&graph, &root, configurations)
        .with_context(|| format!("analyzing '{root}'"))?;

    Ok(Analysis {
        root,
        strategy,
        concurrency,
        results,
    })
}

fn resolve_report(name: Option<&str>) -> Result<ReportFormat> {
    match name {
        Some("human") | None => Ok(ReportFormat::Human),
        Some("json") => Ok(ReportFormat::Json),
        Some(other) => bail!("unknown report format: '{other}'. Choose: human, json"),
    }
}

/// One line per configuration, in configuration order.
pub fn render_human(analysis: &Analysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Reliability of {} ({} strategy, {}, {} configuration(s))",
        analysis.root,
        analysis.strategy,
        analysis.concurrency,
        analysis.results.len()
    );

    let labels: Vec<String> = analysis
        .results
        .iter()
        .map(|(configuration, _)| configuration.to_string())
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    for (label, (_, outcome)) in labels.iter().zip(analysis.results.iter()) {
        let _ = match outcome {
            Ok(value) => writeln!(out, "  {label:<width$}  {value:.6}"),
            Err(e) => writeln!(out, "  {label:<width$}  error: {e}"),
        };
    }
    out
}

pub fn render_json(analysis: &Analysis) -> serde_json::Value {
    serde_json::json!({
        "root": analysis.root,
        "strategy": analysis.strategy,
        "concurrency": analysis.concurrency,
        "results": analysis.results.iter().map(|(configuration, outcome)| {
            match outcome {
                Ok(value) => serde_json::json!({
                    "configuration": configuration,
                    "reliability": value,
                }),
                Err(e) => serde_json::json!({
                    "configuration": configuration,
                    "error": e.to_string(),
                }),
            }
        }).collect::<Vec<_>>(),
    })
}
