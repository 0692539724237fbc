//! The merger: load categorized input files into per-file named graphs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use oxrdf::{GraphName, NamedNode, Quad};
use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use pythinfer_store::{Category, QuadStore};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::project::Project;

/// What the merger loaded, including the category → graph-names index the
/// driver uses to build its views.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub reference_graphs: Vec<GraphName>,
    pub local_graphs: Vec<GraphName>,
    pub files_loaded: usize,
    pub triples_loaded: usize,
}

/// Graph name for an input file: the `file://` IRI of its absolute path.
pub fn file_graph_name(path: &Path) -> Result<GraphName> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| PipelineError::io(path, e))?
            .join(path)
    };
    // the only IRI-hostile character that shows up in practice
    let iri = format!("file://{}", absolute.display()).replace(' ', "%20");
    let node = NamedNode::new(&iri).map_err(|e| PipelineError::Parse {
        path: path.to_path_buf(),
        format: "IRI".to_owned(),
        message: e.to_string(),
    })?;
    Ok(GraphName::from(node))
}

/// Load every input of the project into the store, one named graph per
/// file, categories recorded at graph creation.
///
/// Any parse failure is fatal for the whole batch; the caller discards the
/// store rather than keeping partial results.
pub fn merge_project(store: &mut QuadStore, project: &Project) -> Result<MergeOutcome> {
    let mut outcome = MergeOutcome::default();

    for (path, category) in categorized_inputs(project) {
        let graph = file_graph_name(path)?;
        store.create_graph(graph.clone(), category)?;
        let count = load_file(store, path, &graph)?;
        debug!(path = %path.display(), category = %category, triples = count, "loaded");
        outcome.files_loaded += 1;
        outcome.triples_loaded += count;
        match category {
            Category::Reference => outcome.reference_graphs.push(graph),
            Category::Local => outcome.local_graphs.push(graph),
            Category::Derived => {}
        }
    }

    info!(
        files = outcome.files_loaded,
        triples = outcome.triples_loaded,
        reference = outcome.reference_graphs.len(),
        local = outcome.local_graphs.len(),
        "merge complete"
    );
    Ok(outcome)
}

fn categorized_inputs(project: &Project) -> impl Iterator<Item = (&Path, Category)> {
    project
        .reference_files
        .iter()
        .map(|p| (p.as_path(), Category::Reference))
        .chain(
            project
                .local_files
                .iter()
                .map(|p| (p.as_path(), Category::Local)),
        )
}

/// Parse one file into its graph. Blank nodes are renamed so identity never
/// leaks across files; graph names embedded in quad formats are discarded
/// in favor of the per-file provenance graph.
fn load_file(store: &mut QuadStore, path: &Path, graph: &GraphName) -> Result<usize> {
    let format = format_for_path(path);
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let parser = RdfParser::from_format(format)
        .rename_blank_nodes()
        .for_reader(BufReader::new(file));

    let mut count = 0;
    for quad in parser {
        let quad = quad.map_err(|e| parse_error(path, format, e))?;
        let rehomed = Quad::new(quad.subject, quad.predicate, quad.object, graph.clone());
        if store.insert(rehomed) {
            count += 1;
        }
    }
    Ok(count)
}

/// Format from the file extension, defaulting to Turtle.
pub fn format_for_path(path: &Path) -> RdfFormat {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(RdfFormat::from_extension)
        .unwrap_or(RdfFormat::Turtle)
}

fn parse_error(path: &Path, format: RdfFormat, error: RdfParseError) -> PipelineError {
    let message = match &error {
        RdfParseError::Syntax(syntax) => match syntax.location() {
            Some(location) => format!(
                "{error} (line {}, column {})",
                location.start.line + 1,
                location.start.column + 1
            ),
            None => error.to_string(),
        },
        RdfParseError::Io(_) => error.to_string(),
    };
    PipelineError::Parse {
        path: path.to_path_buf(),
        format: format.name().to_owned(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::PROJECT_FILE_NAME;
    use std::fs;

    fn project_with(dir: &Path, yaml: &str) -> Project {
        let config = dir.join(PROJECT_FILE_NAME);
        fs::write(&config, yaml).unwrap();
        Project::load(&config).unwrap()
    }

    #[test]
    fn each_file_lands_in_its_own_graph() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.ttl"),
            "<urn:x> <urn:p> <urn:y> .\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.ttl"),
            "<urn:x> <urn:p> <urn:z> .\n",
        )
        .unwrap();
        let project = project_with(
            dir.path(),
            "data:\n  local: [a.ttl]\n  reference: [b.ttl]\n",
        );

        let mut store = QuadStore::new();
        let outcome = merge_project(&mut store, &project).unwrap();

        assert_eq!(outcome.files_loaded, 2);
        assert_eq!(outcome.triples_loaded, 2);
        assert_eq!(outcome.local_graphs.len(), 1);
        assert_eq!(outcome.reference_graphs.len(), 1);

        let local = &outcome.local_graphs[0];
        assert!(local.to_string().contains("a.ttl"));
        assert_eq!(store.category(local), Some(Category::Local));
        assert_eq!(store.graph_len(local), 1);
        assert_eq!(
            store.category(&outcome.reference_graphs[0]),
            Some(Category::Reference)
        );
    }

    #[test]
    fn blank_nodes_do_not_merge_across_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ttl"), "_:b <urn:p> <urn:x> .\n").unwrap();
        fs::write(dir.path().join("b.ttl"), "_:b <urn:p> <urn:y> .\n").unwrap();
        let project = project_with(dir.path(), "data:\n  local: [a.ttl, b.ttl]\n");

        let mut store = QuadStore::new();
        merge_project(&mut store, &project).unwrap();

        let subjects: std::collections::HashSet<String> = store
            .iter()
            .map(|q| q.subject.to_string())
            .collect();
        assert_eq!(subjects.len(), 2, "blank nodes were merged: {subjects:?}");
    }

    #[test]
    fn parse_failures_cite_path_format_and_position() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.ttl"), "<urn:x> <urn:p .\n").unwrap();
        let project = project_with(dir.path(), "data:\n  local: [bad.ttl]\n");

        let mut store = QuadStore::new();
        let err = merge_project(&mut store, &project).unwrap_err();
        match err {
            PipelineError::Parse { path, format, message } => {
                assert!(path.ends_with("bad.ttl"));
                assert_eq!(format, "Turtle");
                assert!(message.contains("line"), "no position in: {message}");
            }
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn trig_graph_names_are_replaced_by_file_provenance() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("named.trig"),
            "<urn:g> { <urn:x> <urn:p> <urn:y> . }\n",
        )
        .unwrap();
        let project = project_with(dir.path(), "data:\n  local: [named.trig]\n");

        let mut store = QuadStore::new();
        let outcome = merge_project(&mut store, &project).unwrap();
        let graph = &outcome.local_graphs[0];
        assert_eq!(store.graph_len(graph), 1);
        assert_eq!(store.len(), 1);
    }
}
