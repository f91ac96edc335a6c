//! Reliant CLI: reliability analysis of software product lines.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::analyze::AnalyzeArgs;
use manifest::ReliantManifest;

#[derive(Parser)]
#[command(
    name = "reliant",
    version,
    about = "Reliability analysis of software product lines"
)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create reliant.toml and sample inputs
    Init {
        /// Project name; initializes the current directory when omitted
        name: Option<String>,
    },
    /// Compute the reliability of every configuration in a list
    Analyze {
        /// Sequence diagram (JSON)
        #[arg(long)]
        diagram: Option<String>,
        /// Configuration list, one configuration per line
        #[arg(long)]
        configurations: Option<String>,
        /// Analysis strategy (feature, product, family)
        #[arg(long)]
        strategy: Option<String>,
        /// Evaluate configurations on the calling thread
        #[arg(long)]
        sequential: bool,
        /// Root node id (default: the top-level diagram)
        #[arg(long)]
        root: Option<String>,
        /// Report format (human, json)
        #[arg(long)]
        report: Option<String>,
        /// Write the dependency graph as Graphviz text
        #[arg(long)]
        dot: Option<String>,
    },
    /// Print the state model of every dependency graph node
    Models {
        /// Sequence diagram (JSON)
        #[arg(long)]
        diagram: Option<String>,
        /// Output format (text, dot)
        #[arg(long)]
        format: Option<String>,
    },
    /// Print the family reliability expression of a node
    Expression {
        /// Sequence diagram (JSON)
        #[arg(long)]
        diagram: Option<String>,
        /// Root node id (default: the top-level diagram)
        #[arg(long)]
        root: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&cwd, name.as_deref()),

        Commands::Analyze {
            diagram,
            configurations,
            strategy,
            sequential,
            root,
            report,
            dot,
        } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            let args = AnalyzeArgs {
                diagram: diagram.as_deref(),
                configurations: configurations.as_deref(),
                strategy: strategy.as_deref(),
                sequential,
                root: root.as_deref(),
                report: report.as_deref(),
                dot: dot.as_deref(),
            };
            commands::analyze::run(&project_dir, manifest.as_ref(), &args)
        }

        Commands::Models { diagram, format } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::models::run(
                &project_dir,
                manifest.as_ref(),
                diagram.as_deref(),
                format.as_deref(),
            )
        }

        Commands::Expression { diagram, root } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::expression::run(
                &project_dir,
                manifest.as_ref(),
                diagram.as_deref(),
                root.as_deref(),
            )
        }
    }
}

fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(Option<ReliantManifest>, Option<PathBuf>)> {
    match ReliantManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}
