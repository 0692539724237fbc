//! Heuristic rules: SPARQL CONSTRUCT queries and registered procedural
//! functions, applied in configured order.

use std::path::Path;
use std::sync::Arc;

use oxrdf::Triple;
use pythinfer_sparql::{SparqlQuery, TripleIndex};
use pythinfer_store::RestrictedView;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::project::Project;

/// A procedural rule: a pure function of a read-only view.
///
/// Rules return plain triples; the runner re-homes them into the heuristic
/// output graph, so a rule cannot write anywhere else by construction.
pub type ProceduralFn = Arc<dyn Fn(&RestrictedView<'_>) -> Vec<Triple> + Send + Sync>;

/// Registry of procedural rules, built from code at run start and looked up
/// by the identifiers the project configuration lists.
#[derive(Default, Clone)]
pub struct ProceduralRegistry {
    rules: FxHashMap<String, ProceduralFn>,
}

impl ProceduralRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        rule: impl Fn(&RestrictedView<'_>) -> Vec<Triple> + Send + Sync + 'static,
    ) {
        self.rules.insert(id.into(), Arc::new(rule));
    }

    pub fn get(&self, id: &str) -> Option<ProceduralFn> {
        self.rules.get(id).cloned()
    }
}

impl std::fmt::Debug for ProceduralRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProceduralRegistry")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

enum HeuristicKind {
    SparqlConstruct(SparqlQuery),
    Procedural(ProceduralFn),
}

/// One configured heuristic, identified for diagnostics.
pub struct Heuristic {
    name: String,
    kind: HeuristicKind,
}

impl Heuristic {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate against a read-only view, returning the rule's raw output.
    pub fn evaluate(&self, view: &RestrictedView<'_>) -> Result<Vec<Triple>> {
        let produced = match &self.kind {
            HeuristicKind::SparqlConstruct(query) => {
                let index = TripleIndex::new(view.triples(None, None, None));
                query.construct(&index)?
            }
            HeuristicKind::Procedural(rule) => rule(view),
        };
        debug!(heuristic = %self.name, produced = produced.len(), "heuristic evaluated");
        Ok(produced)
    }
}

impl std::fmt::Debug for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            HeuristicKind::SparqlConstruct(_) => "sparql-construct",
            HeuristicKind::Procedural(_) => "procedural",
        };
        f.debug_struct("Heuristic")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// Load the project's heuristics in configured order: SPARQL files first,
/// then procedural identifiers, mirroring the configuration layout.
///
/// A CONSTRUCT file containing a non-CONSTRUCT query and an unregistered
/// procedural id are both configuration errors, raised before inference.
pub fn load_heuristics(
    project: &Project,
    registry: &ProceduralRegistry,
) -> Result<Vec<Heuristic>> {
    let mut heuristics = Vec::new();

    for path in &project.sparql_heuristics {
        heuristics.push(load_sparql_heuristic(path)?);
    }

    for id in &project.procedural_heuristics {
        let rule = registry.get(id).ok_or_else(|| {
            PipelineError::Config(format!("procedural heuristic '{id}' is not registered"))
        })?;
        heuristics.push(Heuristic {
            name: id.clone(),
            kind: HeuristicKind::Procedural(rule),
        });
    }

    Ok(heuristics)
}

fn load_sparql_heuristic(path: &Path) -> Result<Heuristic> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let query = SparqlQuery::parse(name.clone(), &text)?;
    if query.form() != pythinfer_sparql::QueryForm::Construct {
        return Err(PipelineError::Config(format!(
            "heuristic '{}' must be a CONSTRUCT query",
            path.display()
        )));
    }
    Ok(Heuristic {
        name,
        kind: HeuristicKind::SparqlConstruct(query),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{GraphName, NamedNode, Quad, Term};
    use pythinfer_store::{Category, QuadStore};

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    #[test]
    fn procedural_rules_read_the_view() {
        let graph = GraphName::from(node("urn:data"));
        let mut store = QuadStore::new();
        store.create_graph(graph.clone(), Category::Local).unwrap();
        store.insert(Quad::new(
            node("urn:a"),
            node("urn:p"),
            Term::from(node("urn:b")),
            graph.clone(),
        ));

        let mut registry = ProceduralRegistry::new();
        registry.register("echo-reversed", |view: &RestrictedView<'_>| {
            view.triples(None, None, None)
                .into_iter()
                .filter_map(|t| match &t.object {
                    Term::NamedNode(o) => {
                        Some(Triple::new(o.clone(), t.predicate.clone(), match &t.subject {
                            oxrdf::Subject::NamedNode(s) => Term::from(s.clone()),
                            oxrdf::Subject::BlankNode(b) => Term::from(b.clone()),
                            _ => return None,
                        }))
                    }
                    _ => None,
                })
                .collect()
        });

        let rule = registry.get("echo-reversed").unwrap();
        let heuristic = Heuristic {
            name: "echo-reversed".to_owned(),
            kind: HeuristicKind::Procedural(rule),
        };

        let view = RestrictedView::read_only(&mut store, [graph]);
        let produced = heuristic.evaluate(&view).unwrap();
        assert_eq!(produced, vec![Triple::new(node("urn:b"), node("urn:p"), node("urn:a"))]);
    }

    #[test]
    fn unregistered_procedural_id_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("d.ttl"), "").unwrap();
        let config = dir.path().join("pythinfer.yaml");
        std::fs::write(
            &config,
            "data:\n  local: [d.ttl]\nheuristics:\n  python: [missing-rule]\n",
        )
        .unwrap();
        let project = Project::load(&config).unwrap();

        let err = load_heuristics(&project, &ProceduralRegistry::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn select_query_in_heuristic_slot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("d.ttl"), "").unwrap();
        std::fs::write(
            dir.path().join("rule.rq"),
            "SELECT ?x WHERE { ?x ?p ?o }",
        )
        .unwrap();
        let config = dir.path().join("pythinfer.yaml");
        std::fs::write(
            &config,
            "data:\n  local: [d.ttl]\nheuristics:\n  sparql: [rule.rq]\n",
        )
        .unwrap();
        let project = Project::load(&config).unwrap();

        let err = load_heuristics(&project, &ProceduralRegistry::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
