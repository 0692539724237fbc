//! `pythinfer create`: discover RDF files and write a project config.

use std::path::{Path, PathBuf};

use pythinfer_pipeline::PROJECT_FILE_NAME;
use tracing::info;

use crate::error::{CliError, CliResult};

/// Extensions treated as RDF input when scanning a directory.
const RDF_EXTENSIONS: &[&str] = &["ttl", "nt", "trig", "nq", "rdf"];

pub fn run(folder: Option<&Path>) -> CliResult<()> {
    let folder = match folder {
        Some(f) => f.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let path = create_project(&folder)?;
    println!("created {}", path.display());
    Ok(())
}

/// Scan `folder` for RDF files and write `pythinfer.yaml` next to them.
///
/// All discovered files start as category `local`; reclassifying
/// vocabularies as `reference` is a manual edit.
pub fn create_project(folder: &Path) -> CliResult<PathBuf> {
    let config_path = folder.join(PROJECT_FILE_NAME);
    if config_path.exists() {
        return Err(CliError::AlreadyExists(config_path));
    }

    let mut found = discover_rdf_files(folder)?;
    if found.is_empty() {
        return Err(CliError::NothingFound);
    }
    found.sort();

    let mut yaml = String::from("data:\n  local:\n");
    for file in &found {
        let relative = file.strip_prefix(folder).unwrap_or(file);
        yaml.push_str(&format!("    - {}\n", relative.display()));
    }
    yaml.push_str("  reference: []\n");

    std::fs::write(&config_path, yaml)?;
    info!(files = found.len(), path = %config_path.display(), "project created");
    Ok(config_path)
}

/// Non-recursive scan; projects spanning subdirectories get globs by hand.
fn discover_rdf_files(folder: &Path) -> CliResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_rdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| RDF_EXTENSIONS.contains(&e));
        if is_rdf {
            out.push(path);
        }
    }
    Ok(out)
}
