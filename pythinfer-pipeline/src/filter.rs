//! The filter chain: strip unwanted triples from the exportable quad set.
//!
//! Two sub-phases run in order: streaming per-triple filters, then the
//! whole-graph undeclared-blank-node pass, which iterates to its own fixed
//! point because dropping a triple can undeclare further blank nodes.
//!
//! Invalid RDF of the literal-as-subject kind cannot occur here at all:
//! the term model only admits IRIs and blank nodes in subject position, so
//! that class of backend noise is ruled out before filtering starts.
//!
//! Drops are counted per filter and logged; they are never errors.

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Quad, Term, Triple};
use pythinfer_vocab::owl;
use rustc_hash::FxHashSet;
use tracing::info;

/// A named per-triple rule; returns `true` when the triple must go.
pub struct TripleFilter {
    pub name: &'static str,
    test: fn(&Triple) -> bool,
}

/// Empty string literals carry no information; absence says it better.
fn object_is_empty_string(triple: &Triple) -> bool {
    matches!(&triple.object, Term::Literal(l) if l.value().is_empty())
}

/// Reflexive statements that are true of everything: `x sameAs x` and kin.
fn reflexive_banality(triple: &Triple) -> bool {
    if Term::from(triple.subject.clone()) != triple.object {
        return false;
    }
    let p = triple.predicate.as_ref();
    p == owl::SAME_AS
        || p == owl::EQUIVALENT_CLASS
        || p == owl::EQUIVALENT_PROPERTY
        || p == rdfs::SUB_CLASS_OF
        || p == rdfs::SUB_PROPERTY_OF
}

/// Everything is an `owl:Thing`; saying so adds nothing.
fn trivial_thing_declaration(triple: &Triple) -> bool {
    if triple.object != Term::from(owl::THING) {
        return false;
    }
    let p = triple.predicate.as_ref();
    p == rdf::TYPE || p == rdfs::SUB_CLASS_OF || p == rdfs::DOMAIN || p == rdfs::RANGE
}

/// `owl:Nothing` is a subclass of every class; the inverse direction
/// (`X subClassOf owl:Nothing`) marks a contradiction and is kept.
fn nothing_subclass_banality(triple: &Triple) -> bool {
    triple.subject == owl::NOTHING.into_owned().into()
        && triple.predicate.as_ref() == rdfs::SUB_CLASS_OF
        && triple.object != Term::from(owl::NOTHING)
}

/// The per-triple filter set, in application order.
pub fn unwanted_triple_filters() -> &'static [TripleFilter] {
    &[
        TripleFilter {
            name: "empty-string-object",
            test: object_is_empty_string,
        },
        TripleFilter {
            name: "reflexive-banality",
            test: reflexive_banality,
        },
        TripleFilter {
            name: "trivial-thing-declaration",
            test: trivial_thing_declaration,
        },
        TripleFilter {
            name: "nothing-subclass",
            test: nothing_subclass_banality,
        },
    ]
}

/// Per-filter drop counts for one chain application.
#[derive(Debug, Default)]
pub struct FilterStats {
    pub per_filter: Vec<(&'static str, usize)>,
    pub undeclared_blank_nodes: usize,
}

impl FilterStats {
    pub fn total_dropped(&self) -> usize {
        self.per_filter.iter().map(|(_, n)| n).sum::<usize>() + self.undeclared_blank_nodes
    }
}

/// Apply the whole chain to a quad set, preserving graph names and input
/// order of the survivors. Deterministic: same input, same output.
pub fn apply_filter_chain(quads: Vec<Quad>) -> (Vec<Quad>, FilterStats) {
    let mut stats = FilterStats::default();
    let filters = unwanted_triple_filters();
    let mut counts = vec![0usize; filters.len()];

    let mut kept: Vec<Quad> = Vec::with_capacity(quads.len());
    'quads: for quad in quads {
        let triple = Triple::new(
            quad.subject.clone(),
            quad.predicate.clone(),
            quad.object.clone(),
        );
        for (filter, count) in filters.iter().zip(&mut counts) {
            if (filter.test)(&triple) {
                *count += 1;
                continue 'quads;
            }
        }
        kept.push(quad);
    }
    stats.per_filter = filters
        .iter()
        .map(|f| f.name)
        .zip(counts)
        .collect();

    // whole-graph pass: drop triples touching undeclared blank nodes, to
    // fixed point (a drop can undeclare another blank node)
    loop {
        let declared: FxHashSet<&str> = kept
            .iter()
            .filter_map(|q| match &q.subject {
                oxrdf::Subject::BlankNode(b) => Some(b.as_str()),
                _ => None,
            })
            .collect();
        let undeclared = |quad: &Quad| -> bool {
            let object_bad = matches!(&quad.object, Term::BlankNode(b)
                if !declared.contains(b.as_str()));
            let subject_bad = matches!(&quad.subject, oxrdf::Subject::BlankNode(b)
                if !declared.contains(b.as_str()));
            object_bad || subject_bad
        };
        let before = kept.len();
        let next: Vec<Quad> = kept.iter().filter(|q| !undeclared(q)).cloned().collect();
        let dropped = before - next.len();
        kept = next;
        stats.undeclared_blank_nodes += dropped;
        if dropped == 0 {
            break;
        }
    }

    if stats.total_dropped() > 0 {
        info!(
            dropped = stats.total_dropped(),
            blank_node_drops = stats.undeclared_blank_nodes,
            "filter chain removed unwanted triples"
        );
    }
    (kept, stats)
}
