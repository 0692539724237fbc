//! Project configuration: the `pythinfer.yaml` contract and its discovery.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// File name a project is discovered by.
pub const PROJECT_FILE_NAME: &str = "pythinfer.yaml";

/// How many ancestor directories discovery will climb.
const MAX_DISCOVERY_DEPTH: usize = 10;

/// Default fixed-point round bound.
pub const DEFAULT_ITERATION_BOUND: usize = 16;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    name: Option<String>,
    base_folder: Option<PathBuf>,
    #[serde(default)]
    data: RawData,
    #[serde(default)]
    heuristics: RawHeuristics,
    #[serde(default)]
    output: RawOutput,
    #[serde(default)]
    iteration: RawIteration,
    backend: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawData {
    #[serde(default)]
    local: Vec<String>,
    #[serde(default)]
    reference: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeuristics {
    #[serde(default)]
    sparql: Vec<String>,
    #[serde(default)]
    python: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutput {
    folder: Option<PathBuf>,
    #[serde(default)]
    extra_formats: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIteration {
    bound: Option<usize>,
}

/// A fully resolved project: every relative path anchored at `base_folder`,
/// every glob expanded (sorted, for reproducible graph staging).
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    /// Path of the config file itself.
    pub config_path: PathBuf,
    pub base_folder: PathBuf,
    /// Category `local` inputs.
    pub local_files: Vec<PathBuf>,
    /// Category `reference` inputs.
    pub reference_files: Vec<PathBuf>,
    /// Ordered SPARQL CONSTRUCT heuristic files (`.rq`).
    pub sparql_heuristics: Vec<PathBuf>,
    /// Ordered procedural-rule identifiers.
    pub procedural_heuristics: Vec<String>,
    pub output_folder: PathBuf,
    /// Serialization formats beyond the mandatory quad format.
    pub extra_formats: Vec<String>,
    pub iteration_bound: usize,
    /// Backend selector, `rl-inprocess` unless configured otherwise.
    pub backend: String,
}

impl Project {
    /// Load and resolve a project configuration file.
    pub fn load(config_path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(config_path)
            .map_err(|e| PipelineError::io(config_path, e))?;
        let raw: RawProject = serde_yaml::from_str(&text).map_err(|e| {
            PipelineError::Config(format!("{}: {e}", config_path.display()))
        })?;

        let config_path = absolutize(config_path);
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_folder = match raw.base_folder {
            Some(base) if base.is_absolute() => base,
            Some(base) => config_dir.join(base),
            None => config_dir,
        };

        let name = raw.name.unwrap_or_else(|| {
            config_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pythinfer".to_owned())
        });

        let local_files = expand_patterns(&base_folder, &raw.data.local)?;
        let reference_files = expand_patterns(&base_folder, &raw.data.reference)?;
        let sparql_heuristics = expand_patterns(&base_folder, &raw.heuristics.sparql)?;

        let output_folder = match raw.output.folder {
            Some(folder) if folder.is_absolute() => folder,
            Some(folder) => base_folder.join(folder),
            None => base_folder.join("derived"),
        };

        debug!(
            project = %name,
            local = local_files.len(),
            reference = reference_files.len(),
            "project loaded"
        );

        Ok(Self {
            name,
            config_path,
            base_folder,
            local_files,
            reference_files,
            sparql_heuristics,
            procedural_heuristics: raw.heuristics.python,
            output_folder,
            extra_formats: raw.output.extra_formats,
            iteration_bound: raw.iteration.bound.unwrap_or(DEFAULT_ITERATION_BOUND),
            backend: raw.backend.unwrap_or_else(|| "rl-inprocess".to_owned()),
        })
    }

    /// Every input path the pipeline reads, for cache staleness checks.
    pub fn all_input_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.local_files
            .iter()
            .chain(&self.reference_files)
            .chain(&self.sparql_heuristics)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Expand a list of paths-or-globs against a base folder.
///
/// Globs expand sorted; a non-glob entry must exist. An entry that resolves
/// to nothing is a configuration error rather than a silent no-op.
fn expand_patterns(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in patterns {
        let anchored = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            base.join(pattern)
        };
        let anchored_str = anchored.to_string_lossy().into_owned();

        if anchored.exists() {
            out.push(anchored);
            continue;
        }

        let matches = glob::glob(&anchored_str)
            .map_err(|e| PipelineError::Config(format!("bad pattern '{pattern}': {e}")))?;
        let mut found: Vec<PathBuf> = matches
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        if found.is_empty() {
            return Err(PipelineError::Config(format!(
                "input '{pattern}' matched no files under {}",
                base.display()
            )));
        }
        found.sort();
        out.extend(found);
    }
    Ok(out)
}

/// Walk upward from `start` looking for [`PROJECT_FILE_NAME`].
///
/// Stops (with a `Config` error) above `$HOME`, after ten ancestors, or at
/// the filesystem root.
pub fn discover_project(start: &Path) -> Result<PathBuf> {
    let home = dirs::home_dir();
    let mut current = absolutize(start);
    for _depth in 0..=MAX_DISCOVERY_DEPTH {
        let candidate = current.join(PROJECT_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if let Some(home) = &home {
            if &current == home {
                return Err(PipelineError::Config(format!(
                    "no {PROJECT_FILE_NAME} found before reaching $HOME"
                )));
            }
        }
        if !current.pop() {
            return Err(PipelineError::Config(format!(
                "no {PROJECT_FILE_NAME} found before reaching the filesystem root"
            )));
        }
    }
    Err(PipelineError::Config(format!(
        "no {PROJECT_FILE_NAME} found within {MAX_DISCOVERY_DEPTH} parent directories"
    )))
}
