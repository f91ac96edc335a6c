//! `reliant init`: project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use reliant_graph::{validate_node_id, SequenceDiagram};

use crate::manifest::{ReliantManifest, MANIFEST_FILE};

const CONFIGURATIONS: &str = "\
# One configuration per line; features separated by commas or spaces.
# A lone '-' is the configuration with no optional features.
-
SENSOR
";

/// Create a new project.
///
/// With a name, the directory `name` is created relative to `cwd`.
/// Without one, the project is initialized in `cwd` itself and named after
/// it.
pub fn run(cwd: &Path, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            let project_dir = cwd.join(name);
            if project_dir.exists() {
                bail!("directory '{}' already exists", project_dir.display());
            }
            fs::create_dir_all(&project_dir)
                .with_context(|| format!("creating {}", project_dir.display()))?;
            create_project(&project_dir, name)
        }
        None => {
            let name = cwd
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("reliant-project");
            create_project(cwd, name)
        }
    }
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        bail!("{} already exists", manifest_path.display());
    }

    fs::write(&manifest_path, ReliantManifest::template(name))
        .with_context(|| format!("writing {MANIFEST_FILE}"))?;

    let diagram = serde_json::to_string_pretty(&sample_diagram(name))
        .context("serializing sample diagram")?;
    fs::write(project_dir.join("diagram.json"), diagram).context("writing diagram.json")?;

    fs::write(project_dir.join("configurations.txt"), CONFIGURATIONS)
        .context("writing configurations.txt")?;

    println!("Created project '{name}'");
    println!("  {MANIFEST_FILE}");
    println!("  diagram.json");
    println!("  configurations.txt");

    Ok(())
}

/// A two-step diagram with one optional call, enough to run `analyze`.
fn sample_diagram(name: &str) -> SequenceDiagram {
    SequenceDiagram::new(diagram_id(name))
        .message("request", 0.99)
        .optional(
            SequenceDiagram::new("Sensor")
                .with_guard("SENSOR")
                .message("sample", 0.95),
        )
        .message("respond", 0.999)
}

/// Project names may contain characters a node id cannot.
fn diagram_id(project: &str) -> String {
    let id: String = project
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if validate_node_id(&id).is_ok() {
        id
    } else {
        format!("system_{id}")
    }
}
