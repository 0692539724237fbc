//! Cache probe for the quad-format export.
//!
//! `combined_full.trig` doubles as a cache of the full pipeline run. The
//! probe only trusts it when it is newer than the config file and every
//! input; anything else counts as stale and the caller recomputes. The
//! core never assumes freshness beyond this check.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use oxrdfio::{RdfFormat, RdfParser};
use pythinfer_store::QuadStore;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::export::Artifact;
use crate::project::Project;

/// Path of the cacheable artifact for a project.
pub fn cache_path(project: &Project) -> PathBuf {
    project
        .output_folder
        .join(format!("{}.trig", Artifact::CombinedFull.file_stem()))
}

/// Load the cached combined-full dataset if it exists and is fresh.
///
/// Returns `None` when there is no cache or any input (or the config
/// itself) is newer than it.
pub fn load_cached_combined_full(project: &Project) -> Result<Option<QuadStore>> {
    let cache = cache_path(project);
    let Some(cache_mtime) = mtime(&cache) else {
        return Ok(None);
    };

    let inputs = std::iter::once(&project.config_path).chain(project.all_input_paths());
    for input in inputs {
        match mtime(input) {
            Some(input_mtime) if input_mtime <= cache_mtime => {}
            _ => {
                info!(
                    cache = %cache.display(),
                    input = %input.display(),
                    "cache is stale"
                );
                return Ok(None);
            }
        }
    }

    debug!(cache = %cache.display(), "loading cached dataset");
    let file = File::open(&cache).map_err(|e| PipelineError::io(&cache, e))?;
    let parser = RdfParser::from_format(RdfFormat::TriG).for_reader(BufReader::new(file));
    let mut store = QuadStore::new();
    for quad in parser {
        let quad = quad.map_err(|e| PipelineError::Parse {
            path: cache.clone(),
            format: RdfFormat::TriG.name().to_owned(),
            message: e.to_string(),
        })?;
        store.insert(quad);
    }
    Ok(Some(store))
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
