//! In-process OWL-RL entailment backend.
//!
//! The backend reads a restricted view, computes the RL closure of the
//! visible triples with a semi-naive rule engine, and deposits the
//! entailments that are not already visible into a single target graph.
//! Nothing else in the store is touched; violations of that contract
//! surface as typed store errors rather than silent writes.

pub mod delta;
pub mod error;
pub mod fixpoint;
pub mod ontology;
pub mod rules;

pub use error::{ReasonerError, Result};
pub use fixpoint::{compute_closure, ReasoningBudget};
pub use ontology::RlOntology;

use std::str::FromStr;

use oxrdf::{GraphName, Quad};
use pythinfer_store::RestrictedView;
use rustc_hash::FxHashMap;
use tracing::info;

/// Counters collected while computing one closure.
#[derive(Debug, Default)]
pub struct ReasoningDiagnostics {
    /// Rule rounds until fixpoint.
    pub rounds: usize,
    /// Entailed triples not among the inputs.
    pub facts_derived: usize,
    /// Whether the fact budget stopped the run early.
    pub capped: bool,
    rules_fired: FxHashMap<&'static str, usize>,
}

impl ReasoningDiagnostics {
    pub fn record_rule_fired(&mut self, rule: &'static str) {
        *self.rules_fired.entry(rule).or_default() += 1;
    }

    pub fn rules_fired(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.rules_fired.iter().map(|(rule, count)| (*rule, *count))
    }
}

/// A reasoner backend: compute entailments of a view into a target graph.
///
/// Implementations must only mutate `target`, and must only deposit triples
/// that are not already visible through the view (the pipeline diffs
/// entailment sets between stages, so deltas have to be real deltas).
pub trait ReasonerBackend {
    fn name(&self) -> &'static str;

    /// Returns the number of triples added to `target`.
    fn reason(&self, view: &mut RestrictedView<'_>, target: &GraphName) -> Result<usize>;
}

/// The first-class in-process RL backend.
#[derive(Debug, Default)]
pub struct RlInProcessBackend {
    budget: ReasoningBudget,
}

impl RlInProcessBackend {
    pub fn new(budget: ReasoningBudget) -> Self {
        Self { budget }
    }
}

impl ReasonerBackend for RlInProcessBackend {
    fn name(&self) -> &'static str {
        "rl-inprocess"
    }

    fn reason(&self, view: &mut RestrictedView<'_>, target: &GraphName) -> Result<usize> {
        let base = view.triples(None, None, None);
        let (entailed, diagnostics) = compute_closure(&base, &self.budget);

        let quads: Vec<Quad> = entailed
            .into_iter()
            .filter(|t| !view.contains_triple(t))
            .map(|t| Quad::new(t.subject, t.predicate, t.object, target.clone()))
            .collect();
        let added = view.bulk_insert(quads)?;
        info!(
            backend = self.name(),
            inputs = base.len(),
            rounds = diagnostics.rounds,
            added,
            capped = diagnostics.capped,
            "entailment pass complete"
        );
        Ok(added)
    }
}

/// Backend selector, parsed from project configuration.
///
/// Only `rl-inprocess` is built in; the variant list is the seam where
/// external backends would plug in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    RlInProcess,
}

impl BackendKind {
    pub fn instantiate(self) -> Box<dyn ReasonerBackend> {
        match self {
            BackendKind::RlInProcess => Box::new(RlInProcessBackend::default()),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ReasonerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rl-inprocess" => Ok(BackendKind::RlInProcess),
            other => Err(ReasonerError::UnsupportedBackend {
                name: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::rdf;
    use oxrdf::{NamedNode, Term, Triple};
    use pythinfer_store::{Category, QuadStore};
    use pythinfer_vocab::owl;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn graph(iri: &str) -> GraphName {
        GraphName::from(node(iri))
    }

    #[test]
    fn backend_deposits_delta_into_target_only() {
        let mut store = QuadStore::new();
        let data = graph("urn:data");
        let target = graph("urn:inferences");
        store.create_graph(data.clone(), Category::Local).unwrap();
        store.create_graph(target.clone(), Category::Derived).unwrap();
        store.insert(Quad::new(
            node("urn:knows"),
            rdf::TYPE.into_owned(),
            Term::from(owl::SYMMETRIC_PROPERTY),
            data.clone(),
        ));
        store.insert(Quad::new(
            node("urn:bob"),
            node("urn:knows"),
            Term::from(node("urn:alice")),
            data.clone(),
        ));

        let backend = RlInProcessBackend::default();
        let mut view = RestrictedView::new(&mut store, [data.clone(), target.clone()]);
        let added = backend.reason(&mut view, &target).unwrap();
        assert_eq!(added, 1);

        let expected = Triple::new(node("urn:alice"), node("urn:knows"), node("urn:bob"));
        assert!(store.contains_triple_in(&expected, &target));
        assert!(!store.contains_triple_in(&expected, &data));
        assert_eq!(store.graph_len(&data), 2);
    }

    #[test]
    fn second_pass_adds_nothing() {
        let mut store = QuadStore::new();
        let data = graph("urn:data");
        let target = graph("urn:inferences");
        store.create_graph(data.clone(), Category::Local).unwrap();
        store.create_graph(target.clone(), Category::Derived).unwrap();
        store.insert(Quad::new(
            node("urn:knows"),
            rdf::TYPE.into_owned(),
            Term::from(owl::SYMMETRIC_PROPERTY),
            data.clone(),
        ));
        store.insert(Quad::new(
            node("urn:bob"),
            node("urn:knows"),
            Term::from(node("urn:alice")),
            data.clone(),
        ));

        let backend = RlInProcessBackend::default();
        let mut view = RestrictedView::new(&mut store, [data.clone(), target.clone()]);
        assert_eq!(backend.reason(&mut view, &target).unwrap(), 1);
        let mut view = RestrictedView::new(&mut store, [data, target.clone()]);
        assert_eq!(backend.reason(&mut view, &target).unwrap(), 0);
    }

    #[test]
    fn unknown_backend_selector_is_rejected() {
        let err = BackendKind::from_str("external-cli").unwrap_err();
        assert!(matches!(err, ReasonerError::UnsupportedBackend { ref name } if name == "external-cli"));
        assert_eq!(BackendKind::from_str("rl-inprocess").unwrap(), BackendKind::RlInProcess);
    }
}
