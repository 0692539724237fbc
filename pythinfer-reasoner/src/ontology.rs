//! Ontology extraction for the RL rule set.
//!
//! One pass over the input triples collects the schema-level assertions the
//! materialization rules key on: property characteristics, inverse pairs,
//! domain/range declarations, and the subclass / subproperty hierarchies
//! (stored as transitive closures so each rule application is a single
//! lookup).

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{NamedNode, Term, Triple};
use pythinfer_vocab::owl;
use rustc_hash::{FxHashMap, FxHashSet};

/// Schema assertions the RL rules consume, extracted once per backend run.
#[derive(Debug, Default)]
pub struct RlOntology {
    /// Properties declared owl:SymmetricProperty.
    symmetric: FxHashSet<NamedNode>,
    /// Properties declared owl:TransitiveProperty.
    transitive: FxHashSet<NamedNode>,
    /// Properties declared owl:FunctionalProperty.
    functional: FxHashSet<NamedNode>,
    /// Properties declared owl:InverseFunctionalProperty.
    inverse_functional: FxHashSet<NamedNode>,
    /// P → inverses of P (both directions of each owl:inverseOf).
    inverse_of: FxHashMap<NamedNode, Vec<NamedNode>>,
    /// P → domain classes.
    domain: FxHashMap<NamedNode, Vec<Term>>,
    /// P → range classes.
    range: FxHashMap<NamedNode, Vec<Term>>,
    /// P → all super-properties (rdfs:subPropertyOf closure, with
    /// owl:equivalentProperty folded in as mutual sub-property edges).
    super_properties: FxHashMap<NamedNode, Vec<NamedNode>>,
    /// C → all strict super-classes (rdfs:subClassOf closure).
    super_classes: FxHashMap<Term, Vec<Term>>,
    /// C → equivalent classes (both directions).
    equivalent_classes: FxHashMap<Term, Vec<Term>>,
}

impl RlOntology {
    /// Scan the input triples for schema assertions.
    pub fn extract(triples: &[Triple]) -> Self {
        let mut symmetric = FxHashSet::default();
        let mut transitive = FxHashSet::default();
        let mut functional = FxHashSet::default();
        let mut inverse_functional = FxHashSet::default();
        let mut inverse_of: FxHashMap<NamedNode, Vec<NamedNode>> = FxHashMap::default();
        let mut domain: FxHashMap<NamedNode, Vec<Term>> = FxHashMap::default();
        let mut range: FxHashMap<NamedNode, Vec<Term>> = FxHashMap::default();
        let mut sub_property_edges: FxHashMap<NamedNode, Vec<NamedNode>> = FxHashMap::default();
        let mut sub_class_edges: FxHashMap<Term, Vec<Term>> = FxHashMap::default();
        let mut equivalent_classes: FxHashMap<Term, Vec<Term>> = FxHashMap::default();

        for triple in triples {
            let predicate = triple.predicate.as_ref();
            if predicate == rdf::TYPE {
                if let Some(property) = subject_named(triple) {
                    if triple.object == Term::from(owl::SYMMETRIC_PROPERTY) {
                        symmetric.insert(property);
                    } else if triple.object == Term::from(owl::TRANSITIVE_PROPERTY) {
                        transitive.insert(property);
                    } else if triple.object == Term::from(owl::FUNCTIONAL_PROPERTY) {
                        functional.insert(property);
                    } else if triple.object == Term::from(owl::INVERSE_FUNCTIONAL_PROPERTY) {
                        inverse_functional.insert(property);
                    }
                }
            } else if predicate == owl::INVERSE_OF {
                if let (Some(p), Term::NamedNode(q)) = (subject_named(triple), &triple.object) {
                    push_unique(inverse_of.entry(p.clone()).or_default(), q.clone());
                    push_unique(inverse_of.entry(q.clone()).or_default(), p);
                }
            } else if predicate == rdfs::DOMAIN {
                if let Some(p) = subject_named(triple) {
                    if is_resource(&triple.object) {
                        push_unique(domain.entry(p).or_default(), triple.object.clone());
                    }
                }
            } else if predicate == rdfs::RANGE {
                if let Some(p) = subject_named(triple) {
                    if is_resource(&triple.object) {
                        push_unique(range.entry(p).or_default(), triple.object.clone());
                    }
                }
            } else if predicate == rdfs::SUB_PROPERTY_OF {
                if let (Some(p), Term::NamedNode(q)) = (subject_named(triple), &triple.object) {
                    push_unique(sub_property_edges.entry(p).or_default(), q.clone());
                }
            } else if predicate == owl::EQUIVALENT_PROPERTY {
                // equivalent properties entail each other's extensions, which
                // is exactly mutual sub-property edges (prp-eqp1/2)
                if let (Some(p), Term::NamedNode(q)) = (subject_named(triple), &triple.object) {
                    push_unique(sub_property_edges.entry(p.clone()).or_default(), q.clone());
                    push_unique(sub_property_edges.entry(q.clone()).or_default(), p);
                }
            } else if predicate == rdfs::SUB_CLASS_OF {
                if is_resource(&triple.object) {
                    let subject = Term::from(triple.subject.clone());
                    push_unique(
                        sub_class_edges.entry(subject).or_default(),
                        triple.object.clone(),
                    );
                }
            } else if predicate == owl::EQUIVALENT_CLASS {
                if is_resource(&triple.object) {
                    let subject = Term::from(triple.subject.clone());
                    push_unique(
                        equivalent_classes.entry(subject.clone()).or_default(),
                        triple.object.clone(),
                    );
                    push_unique(
                        equivalent_classes.entry(triple.object.clone()).or_default(),
                        subject,
                    );
                }
            }
        }

        Self {
            symmetric,
            transitive,
            functional,
            inverse_functional,
            inverse_of,
            domain,
            range,
            super_properties: transitive_closure(&sub_property_edges),
            super_classes: transitive_closure(&sub_class_edges),
            equivalent_classes,
        }
    }

    /// Whether no rule has anything to key on.
    pub fn is_empty(&self) -> bool {
        self.symmetric.is_empty()
            && self.transitive.is_empty()
            && self.functional.is_empty()
            && self.inverse_functional.is_empty()
            && self.inverse_of.is_empty()
            && self.domain.is_empty()
            && self.range.is_empty()
            && self.super_properties.is_empty()
            && self.super_classes.is_empty()
            && self.equivalent_classes.is_empty()
    }

    pub fn is_symmetric(&self, p: &NamedNode) -> bool {
        self.symmetric.contains(p)
    }

    pub fn is_transitive(&self, p: &NamedNode) -> bool {
        self.transitive.contains(p)
    }

    pub fn is_functional(&self, p: &NamedNode) -> bool {
        self.functional.contains(p)
    }

    pub fn is_inverse_functional(&self, p: &NamedNode) -> bool {
        self.inverse_functional.contains(p)
    }

    pub fn inverses_of(&self, p: &NamedNode) -> &[NamedNode] {
        self.inverse_of.get(p).map_or(&[], Vec::as_slice)
    }

    pub fn domains_of(&self, p: &NamedNode) -> &[Term] {
        self.domain.get(p).map_or(&[], Vec::as_slice)
    }

    pub fn ranges_of(&self, p: &NamedNode) -> &[Term] {
        self.range.get(p).map_or(&[], Vec::as_slice)
    }

    pub fn super_properties_of(&self, p: &NamedNode) -> &[NamedNode] {
        self.super_properties.get(p).map_or(&[], Vec::as_slice)
    }

    pub fn super_classes_of(&self, class: &Term) -> &[Term] {
        self.super_classes.get(class).map_or(&[], Vec::as_slice)
    }

    pub fn equivalent_classes_of(&self, class: &Term) -> &[Term] {
        self.equivalent_classes.get(class).map_or(&[], Vec::as_slice)
    }
}

fn subject_named(triple: &Triple) -> Option<NamedNode> {
    match &triple.subject {
        oxrdf::Subject::NamedNode(n) => Some(n.clone()),
        _ => None,
    }
}

fn is_resource(term: &Term) -> bool {
    matches!(term, Term::NamedNode(_) | Term::BlankNode(_))
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Transitive closure of an edge map, excluding each node itself so cycles
/// do not generate reflexive entailments.
fn transitive_closure<T: Clone + Eq + std::hash::Hash>(
    edges: &FxHashMap<T, Vec<T>>,
) -> FxHashMap<T, Vec<T>> {
    let mut closure = FxHashMap::default();
    for start in edges.keys() {
        let mut reachable: Vec<T> = Vec::new();
        let mut visited: FxHashSet<&T> = FxHashSet::default();
        let mut stack: Vec<&T> = vec![start];
        while let Some(node) = stack.pop() {
            for next in edges.get(node).into_iter().flatten() {
                if visited.insert(next) {
                    if next != start {
                        reachable.push(next.clone());
                    }
                    stack.push(next);
                }
            }
        }
        if !reachable.is_empty() {
            closure.insert(start.clone(), reachable);
        }
    }
    closure
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Subject;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn triple(s: &str, p: NamedNode, o: &str) -> Triple {
        Triple::new(node(s), p, Term::from(node(o)))
    }

    #[test]
    fn extracts_property_characteristics() {
        let triples = vec![
            Triple::new(
                node("urn:knows"),
                rdf::TYPE.into_owned(),
                Term::from(owl::SYMMETRIC_PROPERTY),
            ),
            Triple::new(
                node("urn:ancestor"),
                rdf::TYPE.into_owned(),
                Term::from(owl::TRANSITIVE_PROPERTY),
            ),
        ];
        let ontology = RlOntology::extract(&triples);
        assert!(ontology.is_symmetric(&node("urn:knows")));
        assert!(ontology.is_transitive(&node("urn:ancestor")));
        assert!(!ontology.is_symmetric(&node("urn:ancestor")));
    }

    #[test]
    fn inverse_pairs_are_bidirectional() {
        let triples = vec![triple("urn:parent", owl::INVERSE_OF.into_owned(), "urn:child")];
        let ontology = RlOntology::extract(&triples);
        assert_eq!(ontology.inverses_of(&node("urn:parent")), [node("urn:child")]);
        assert_eq!(ontology.inverses_of(&node("urn:child")), [node("urn:parent")]);
    }

    #[test]
    fn subclass_closure_is_transitive_and_irreflexive() {
        let triples = vec![
            triple("urn:A", rdfs::SUB_CLASS_OF.into_owned(), "urn:B"),
            triple("urn:B", rdfs::SUB_CLASS_OF.into_owned(), "urn:C"),
            triple("urn:C", rdfs::SUB_CLASS_OF.into_owned(), "urn:A"),
        ];
        let ontology = RlOntology::extract(&triples);
        let supers = ontology.super_classes_of(&Term::from(node("urn:A")));
        assert_eq!(supers.len(), 2);
        assert!(supers.contains(&Term::from(node("urn:B"))));
        assert!(supers.contains(&Term::from(node("urn:C"))));
        assert!(!supers.contains(&Term::from(node("urn:A"))));
    }

    #[test]
    fn equivalent_property_folds_into_superproperties() {
        let triples = vec![triple(
            "urn:p",
            owl::EQUIVALENT_PROPERTY.into_owned(),
            "urn:q",
        )];
        let ontology = RlOntology::extract(&triples);
        assert_eq!(ontology.super_properties_of(&node("urn:p")), [node("urn:q")]);
        assert_eq!(ontology.super_properties_of(&node("urn:q")), [node("urn:p")]);
    }

    #[test]
    fn blank_subjects_do_not_declare_properties() {
        let triples = vec![Triple::new(
            Subject::from(oxrdf::BlankNode::default()),
            rdf::TYPE.into_owned(),
            Term::from(owl::SYMMETRIC_PROPERTY),
        )];
        let ontology = RlOntology::extract(&triples);
        assert!(ontology.is_empty());
    }
}
