//! The fixed-point driver: alternate backend entailment and heuristics
//! until the store stops growing or the round bound is hit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use oxrdf::{GraphName, Quad};
use pythinfer_reasoner::ReasonerBackend;
use pythinfer_store::{Category, QuadStore, RestrictedView};
use pythinfer_vocab::graphs;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::heuristics::Heuristic;
use crate::merge::MergeOutcome;

/// Cooperative cancellation flag, checked between rounds and between
/// heuristics. Cancellation discards the run; nothing is exported.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// How a fixpoint run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// A round added no triples; one more round would be a no-op.
    Converged,
    /// The round bound was hit first. Non-fatal: the partial closure is
    /// still well-defined and proceeds to filtering.
    BoundExceeded,
}

/// Counters for one driver run.
#[derive(Debug)]
pub struct DriverReport {
    pub rounds: usize,
    pub outcome: DriverOutcome,
    /// Triples added in the last completed round.
    pub final_round_delta: usize,
    /// Size of the reference-only entailment graph.
    pub external_entailments: usize,
    /// Size of the full entailment graph after the run.
    pub full_entailments: usize,
    /// Size of the heuristic output graph after the run.
    pub heuristic_entailments: usize,
}

/// Run the pipeline's center: reference-only entailment once, then rounds
/// of full entailment plus heuristics until fixpoint.
pub fn run_to_fixpoint(
    store: &mut QuadStore,
    merge: &MergeOutcome,
    backend: &dyn ReasonerBackend,
    heuristics: &[Heuristic],
    bound: usize,
    cancel: &CancelToken,
) -> Result<DriverReport> {
    let external = GraphName::from(graphs::INFERENCES_EXTERNAL_OWL);
    let full = GraphName::from(graphs::INFERENCES_FULL_OWL);
    let heuristic_out = GraphName::from(graphs::INFERENCES_HEURISTIC);
    for graph in [&external, &full, &heuristic_out] {
        store.create_graph(graph.clone(), Category::Derived)?;
    }

    // reference-only entailment: the noise floor, computed once and kept in
    // its own excluded graph
    cancel.check()?;
    let mut reference_whitelist = merge.reference_graphs.clone();
    reference_whitelist.push(external.clone());
    let mut v_ref = RestrictedView::new(store, reference_whitelist);
    let external_entailments = backend.reason(&mut v_ref, &external)?;
    info!(external_entailments, "reference-only entailment complete");

    // the full view: everything the iterated stages may read
    let mut full_whitelist = merge.reference_graphs.clone();
    full_whitelist.extend(merge.local_graphs.iter().cloned());
    full_whitelist.extend([external.clone(), full.clone(), heuristic_out.clone()]);

    let mut rounds = 0;
    let mut final_round_delta = 0;
    let mut outcome = DriverOutcome::BoundExceeded;

    while rounds < bound {
        cancel.check()?;
        rounds += 1;
        let before = store.len();

        let mut v_full = RestrictedView::new(store, full_whitelist.clone());
        let owl_added = backend.reason(&mut v_full, &full)?;

        let mut heuristic_added = 0;
        for heuristic in heuristics {
            cancel.check()?;
            heuristic_added += apply_heuristic(
                store,
                heuristic,
                &full_whitelist,
                &heuristic_out,
            )?;
        }

        let after = store.len();
        final_round_delta = after - before;
        info!(
            round = rounds,
            owl_added,
            heuristic_added,
            total = after,
            "round complete"
        );
        if final_round_delta == 0 {
            outcome = DriverOutcome::Converged;
            break;
        }
    }

    if outcome == DriverOutcome::BoundExceeded {
        warn!(
            rounds,
            final_round_delta,
            "fixpoint not reached within round bound; proceeding with partial closure"
        );
    }

    Ok(DriverReport {
        rounds,
        outcome,
        final_round_delta,
        external_entailments,
        full_entailments: store.graph_len(&full),
        heuristic_entailments: store.graph_len(&heuristic_out),
    })
}

/// Evaluate one heuristic against a read-only view, then deposit the new
/// triples into the heuristic output graph. Later heuristics in the same
/// round see these writes.
fn apply_heuristic(
    store: &mut QuadStore,
    heuristic: &Heuristic,
    whitelist: &[GraphName],
    target: &GraphName,
) -> Result<usize> {
    let produced = {
        let view = RestrictedView::read_only(store, whitelist.iter().cloned());
        let triples = heuristic.evaluate(&view)?;
        triples
            .into_iter()
            .filter(|t| !view.contains_triple(t))
            .collect::<Vec<_>>()
    };
    let quads: Vec<Quad> = produced
        .into_iter()
        .map(|t| Quad::new(t.subject, t.predicate, t.object, target.clone()))
        .collect();
    let mut writer = RestrictedView::new(store, whitelist.iter().cloned());
    Ok(writer.bulk_insert(quads)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::{load_heuristics, ProceduralRegistry};
    use crate::merge::merge_project;
    use crate::project::Project;
    use oxrdf::{NamedNode, Term, Triple};
    use pythinfer_reasoner::RlInProcessBackend;
    use std::fs;
    use std::path::Path;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn project_with(dir: &Path, yaml: &str) -> Project {
        let config = dir.join("pythinfer.yaml");
        fs::write(&config, yaml).unwrap();
        Project::load(&config).unwrap()
    }

    const SYMMETRIC_INPUT: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix foaf: <http://xmlns.com/foaf/0.1/> .
        @prefix : <urn:people:> .
        foaf:knows a owl:SymmetricProperty .
        :alice a foaf:Person ; foaf:age 30 .
        :bob a foaf:Person ; foaf:knows :alice .
    "#;

    #[test]
    fn converges_and_reports_fixpoint() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("people.ttl"), SYMMETRIC_INPUT).unwrap();
        let project = project_with(dir.path(), "data:\n  local: [people.ttl]\n");

        let mut store = QuadStore::new();
        let merge = merge_project(&mut store, &project).unwrap();
        let backend = RlInProcessBackend::default();
        let report = run_to_fixpoint(
            &mut store,
            &merge,
            &backend,
            &[],
            16,
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(report.outcome, DriverOutcome::Converged);
        assert_eq!(report.final_round_delta, 0);
        // alice knows bob appears only in the full inference graph
        let expected = Triple::new(
            node("urn:people:alice"),
            node("http://xmlns.com/foaf/0.1/knows"),
            Term::from(node("urn:people:bob")),
        );
        let full = GraphName::from(graphs::INFERENCES_FULL_OWL);
        assert!(store.contains_triple_in(&expected, &full));
    }

    #[test]
    fn heuristics_and_reasoner_feed_each_other() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("people.ttl"), SYMMETRIC_INPUT).unwrap();
        fs::write(
            dir.path().join("celebrity.rq"),
            r#"
            PREFIX foaf: <http://xmlns.com/foaf/0.1/>
            CONSTRUCT { ?x foaf:knows <urn:people:jamiroquai> }
            WHERE {
                ?x foaf:age ?age ; foaf:knows <urn:people:bob> .
                FILTER(?age > 29)
            }
            "#,
        )
        .unwrap();
        let project = project_with(
            dir.path(),
            "data:\n  local: [people.ttl]\nheuristics:\n  sparql: [celebrity.rq]\n",
        );

        let mut store = QuadStore::new();
        let merge = merge_project(&mut store, &project).unwrap();
        let heuristics = load_heuristics(&project, &ProceduralRegistry::new()).unwrap();
        let backend = RlInProcessBackend::default();
        let report = run_to_fixpoint(
            &mut store,
            &merge,
            &backend,
            &heuristics,
            16,
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(report.outcome, DriverOutcome::Converged);
        assert!(report.rounds <= 3, "took {} rounds", report.rounds);

        let knows = node("http://xmlns.com/foaf/0.1/knows");
        let heuristic_graph = GraphName::from(graphs::INFERENCES_HEURISTIC);
        let full = GraphName::from(graphs::INFERENCES_FULL_OWL);
        // the heuristic fires off the symmetric entailment...
        assert!(store.contains_triple_in(
            &Triple::new(
                node("urn:people:alice"),
                knows.clone(),
                Term::from(node("urn:people:jamiroquai"))
            ),
            &heuristic_graph
        ));
        // ...and a later reasoner pass flips its output
        assert!(store.contains_triple_in(
            &Triple::new(
                node("urn:people:jamiroquai"),
                knows,
                Term::from(node("urn:people:alice"))
            ),
            &full
        ));
    }

    #[test]
    fn too_small_bound_reports_bound_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("people.ttl"), SYMMETRIC_INPUT).unwrap();
        let project = project_with(dir.path(), "data:\n  local: [people.ttl]\n");

        let mut store = QuadStore::new();
        let merge = merge_project(&mut store, &project).unwrap();
        let backend = RlInProcessBackend::default();
        let report = run_to_fixpoint(
            &mut store,
            &merge,
            &backend,
            &[],
            1,
            &CancelToken::new(),
        )
        .unwrap();
        // one round adds the symmetric fact, so one round is not enough to
        // observe a fixpoint
        assert_eq!(report.outcome, DriverOutcome::BoundExceeded);
        assert_eq!(report.rounds, 1);
    }

    #[test]
    fn cancellation_aborts_before_work() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("people.ttl"), SYMMETRIC_INPUT).unwrap();
        let project = project_with(dir.path(), "data:\n  local: [people.ttl]\n");

        let mut store = QuadStore::new();
        let merge = merge_project(&mut store, &project).unwrap();
        let backend = RlInProcessBackend::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_to_fixpoint(&mut store, &merge, &backend, &[], 16, &cancel).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn reference_noise_stays_out_of_full_inferences() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vocab.ttl"),
            r#"
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
            <urn:v:Narrow> rdfs:subClassOf <urn:v:Broad> .
            <urn:v:Broad> rdfs:subClassOf <urn:v:Top> .
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("data.ttl"),
            "<urn:x> a <urn:v:Narrow> .\n",
        )
        .unwrap();
        let project = project_with(
            dir.path(),
            "data:\n  local: [data.ttl]\n  reference: [vocab.ttl]\n",
        );

        let mut store = QuadStore::new();
        let merge = merge_project(&mut store, &project).unwrap();
        let backend = RlInProcessBackend::default();
        run_to_fixpoint(&mut store, &merge, &backend, &[], 16, &CancelToken::new()).unwrap();

        let external = GraphName::from(graphs::INFERENCES_EXTERNAL_OWL);
        let full = GraphName::from(graphs::INFERENCES_FULL_OWL);
        // vocab-only entailment lands in the external graph once
        let noise = Triple::new(
            node("urn:v:Narrow"),
            oxrdf::vocab::rdfs::SUB_CLASS_OF.into_owned(),
            Term::from(node("urn:v:Top")),
        );
        assert!(store.contains_triple_in(&noise, &external));
        assert!(!store.contains_triple_in(&noise, &full));
        // while the user's instance data still gets its entailments
        let wanted = Triple::new(
            node("urn:x"),
            oxrdf::vocab::rdf::TYPE.into_owned(),
            Term::from(node("urn:v:Top")),
        );
        assert!(store.contains_triple_in(&wanted, &full));
    }
}
