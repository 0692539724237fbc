//! Indexed triple sets for semi-naive rule joins.
//!
//! During fixpoint iteration the rules need to find, quickly:
//! - all new triples with a given predicate,
//! - all triples with a given (predicate, subject) or (predicate, object),
//! - all triples touching a given subject or object (for sameAs
//!   replication).

use oxrdf::{NamedNode, Subject, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};

/// The triples produced in one rule round, indexed for joins.
#[derive(Debug, Default)]
pub struct RuleDelta {
    triples: Vec<Triple>,
    by_predicate: FxHashMap<NamedNode, Vec<usize>>,
    by_predicate_subject: FxHashMap<(NamedNode, Subject), Vec<usize>>,
    by_predicate_object: FxHashMap<(NamedNode, Term), Vec<usize>>,
    by_subject: FxHashMap<Subject, Vec<usize>>,
    by_object: FxHashMap<Term, Vec<usize>>,
}

impl RuleDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, triple: Triple) {
        let idx = self.triples.len();
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .push(idx);
        self.by_predicate_subject
            .entry((triple.predicate.clone(), triple.subject.clone()))
            .or_default()
            .push(idx);
        self.by_predicate_object
            .entry((triple.predicate.clone(), triple.object.clone()))
            .or_default()
            .push(idx);
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(idx);
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .push(idx);
        self.triples.push(triple);
    }

    pub fn get_by_p(&self, p: &NamedNode) -> impl Iterator<Item = &Triple> {
        self.by_predicate
            .get(p)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_ps(&self, p: &NamedNode, s: &Subject) -> impl Iterator<Item = &Triple> {
        self.by_predicate_subject
            .get(&(p.clone(), s.clone()))
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_po(&self, p: &NamedNode, o: &Term) -> impl Iterator<Item = &Triple> {
        self.by_predicate_object
            .get(&(p.clone(), o.clone()))
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_subject(&self, s: &Subject) -> impl Iterator<Item = &Triple> {
        self.by_subject
            .get(s)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_object(&self, o: &Term) -> impl Iterator<Item = &Triple> {
        self.by_object
            .get(o)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

/// All triples seen so far (seed facts plus everything derived), with
/// deduplication and the same join indexes as [`RuleDelta`].
#[derive(Debug, Default)]
pub struct DerivedTriples {
    triples: Vec<Triple>,
    seen: FxHashSet<Triple>,
    by_predicate_subject: FxHashMap<(NamedNode, Subject), Vec<usize>>,
    by_predicate_object: FxHashMap<(NamedNode, Term), Vec<usize>>,
    by_subject: FxHashMap<Subject, Vec<usize>>,
    by_object: FxHashMap<Term, Vec<usize>>,
}

impl DerivedTriples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple if not seen before; returns `true` when it was new.
    pub fn try_add(&mut self, triple: Triple) -> bool {
        if !self.seen.insert(triple.clone()) {
            return false;
        }
        let idx = self.triples.len();
        self.by_predicate_subject
            .entry((triple.predicate.clone(), triple.subject.clone()))
            .or_default()
            .push(idx);
        self.by_predicate_object
            .entry((triple.predicate.clone(), triple.object.clone()))
            .or_default()
            .push(idx);
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(idx);
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .push(idx);
        self.triples.push(triple);
        true
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    pub fn get_by_ps(&self, p: &NamedNode, s: &Subject) -> impl Iterator<Item = &Triple> {
        self.by_predicate_subject
            .get(&(p.clone(), s.clone()))
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_po(&self, p: &NamedNode, o: &Term) -> impl Iterator<Item = &Triple> {
        self.by_predicate_object
            .get(&(p.clone(), o.clone()))
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_subject(&self, s: &Subject) -> impl Iterator<Item = &Triple> {
        self.by_subject
            .get(s)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn get_by_object(&self, o: &Term) -> impl Iterator<Item = &Triple> {
        self.by_object
            .get(o)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&i| &self.triples[i]))
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn into_triples(self) -> Vec<Triple> {
        self.triples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(
            NamedNode::new_unchecked(s),
            NamedNode::new_unchecked(p),
            Term::from(NamedNode::new_unchecked(o)),
        )
    }

    #[test]
    fn delta_indexes_by_every_slot() {
        let mut delta = RuleDelta::new();
        delta.push(triple("urn:a", "urn:p", "urn:b"));
        delta.push(triple("urn:b", "urn:p", "urn:c"));
        delta.push(triple("urn:a", "urn:q", "urn:c"));

        let p = NamedNode::new_unchecked("urn:p");
        assert_eq!(delta.get_by_p(&p).count(), 2);

        let s: Subject = NamedNode::new_unchecked("urn:a").into();
        assert_eq!(delta.get_by_ps(&p, &s).count(), 1);
        assert_eq!(delta.get_by_subject(&s).count(), 2);

        let o = Term::from(NamedNode::new_unchecked("urn:c"));
        assert_eq!(delta.get_by_object(&o).count(), 2);
    }

    #[test]
    fn derived_deduplicates() {
        let mut derived = DerivedTriples::new();
        assert!(derived.try_add(triple("urn:a", "urn:p", "urn:b")));
        assert!(!derived.try_add(triple("urn:a", "urn:p", "urn:b")));
        assert!(derived.contains(&triple("urn:a", "urn:p", "urn:b")));
        assert_eq!(derived.len(), 1);
    }
}
