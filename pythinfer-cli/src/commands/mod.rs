pub mod create;
pub mod infer;
pub mod merge;
pub mod query;

use std::path::{Path, PathBuf};

use pythinfer_pipeline::{discover_project, Project};
use tracing::info;

use crate::error::{CliError, CliResult};

/// Resolve the project config: explicit `--config`, discovery, or (unless
/// `--no-create`) automatic creation in the current directory.
pub fn resolve_project(config: Option<&Path>, no_create: bool) -> CliResult<Project> {
    if let Some(path) = config {
        return Ok(Project::load(path)?);
    }
    let cwd = std::env::current_dir()?;
    match discover_project(&cwd) {
        Ok(path) => Ok(Project::load(&path)?),
        Err(_) if !no_create => {
            info!("no project config found, creating one");
            let path = create::create_project(&cwd)?;
            Ok(Project::load(&path)?)
        }
        Err(e) => Err(CliError::from(e)),
    }
}

/// Read an argument that is either inline text or a path to a file.
pub fn text_or_file(argument: &str) -> CliResult<String> {
    let path = PathBuf::from(argument);
    if path.is_file() {
        Ok(std::fs::read_to_string(&path)?)
    } else {
        Ok(argument.to_owned())
    }
}
