//! RL materialization rules.
//!
//! Each function applies one rule of the profile to the current delta,
//! joining against everything derived so far, and pushes new conclusions
//! into `new_delta`. Dedup against `derived` happens both here (to keep the
//! delta small) and again when the fixpoint loop merges.

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{NamedNode, Subject, Term, Triple};
use pythinfer_vocab::owl;

use crate::delta::{DerivedTriples, RuleDelta};
use crate::ontology::RlOntology;
use crate::ReasoningDiagnostics;

fn term_as_subject(term: &Term) -> Option<Subject> {
    match term {
        Term::NamedNode(n) => Some(Subject::from(n.clone())),
        Term::BlankNode(b) => Some(Subject::from(b.clone())),
        _ => None,
    }
}

fn emit(
    triple: Triple,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
    rule: &'static str,
) {
    // never materialize reflexive sameAs; it is axiom noise by construction
    if triple.predicate.as_ref() == owl::SAME_AS
        && Term::from(triple.subject.clone()) == triple.object
    {
        return;
    }
    if !derived.contains(&triple) {
        new_delta.push(triple);
        diagnostics.record_rule_fired(rule);
    }
}

/// prp-symp: `P(x, y), SymmetricProperty(P) → P(y, x)`
pub fn apply_symmetric_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    for triple in delta.iter() {
        if !ontology.is_symmetric(&triple.predicate) {
            continue;
        }
        let Some(subject) = term_as_subject(&triple.object) else {
            continue;
        };
        let flipped = Triple::new(
            subject,
            triple.predicate.clone(),
            Term::from(triple.subject.clone()),
        );
        emit(flipped, derived, new_delta, diagnostics, "prp-symp");
    }
}

/// prp-trp: `P(x, y), P(y, z), TransitiveProperty(P) → P(x, z)`
///
/// Joined in both directions so chains spanning the delta and earlier
/// rounds are found.
pub fn apply_transitive_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    for triple in delta.iter() {
        if !ontology.is_transitive(&triple.predicate) {
            continue;
        }
        let p = &triple.predicate;
        // forward: delta has P(x, y); find P(y, z)
        if let Some(y) = term_as_subject(&triple.object) {
            let continuations: Vec<Term> = derived
                .get_by_ps(p, &y)
                .chain(delta.get_by_ps(p, &y))
                .map(|t| t.object.clone())
                .collect();
            for z in continuations {
                let conclusion = Triple::new(triple.subject.clone(), p.clone(), z);
                emit(conclusion, derived, new_delta, diagnostics, "prp-trp");
            }
        }
        // backward: delta has P(y, z); find P(x, y)
        let y_term = Term::from(triple.subject.clone());
        let starts: Vec<Subject> = derived
            .get_by_po(p, &y_term)
            .chain(delta.get_by_po(p, &y_term))
            .map(|t| t.subject.clone())
            .collect();
        for x in starts {
            let conclusion = Triple::new(x, p.clone(), triple.object.clone());
            emit(conclusion, derived, new_delta, diagnostics, "prp-trp");
        }
    }
}

/// prp-inv: `P(x, y), inverseOf(P, Q) → Q(y, x)`
pub fn apply_inverse_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    for triple in delta.iter() {
        let inverses = ontology.inverses_of(&triple.predicate);
        if inverses.is_empty() {
            continue;
        }
        let Some(subject) = term_as_subject(&triple.object) else {
            continue;
        };
        for q in inverses {
            let conclusion = Triple::new(
                subject.clone(),
                q.clone(),
                Term::from(triple.subject.clone()),
            );
            emit(conclusion, derived, new_delta, diagnostics, "prp-inv");
        }
    }
}

/// prp-dom: `P(x, y), domain(P, C) → type(x, C)`
pub fn apply_domain_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    for triple in delta.iter() {
        for class in ontology.domains_of(&triple.predicate) {
            let conclusion = Triple::new(
                triple.subject.clone(),
                rdf::TYPE.into_owned(),
                class.clone(),
            );
            emit(conclusion, derived, new_delta, diagnostics, "prp-dom");
        }
    }
}

/// prp-rng: `P(x, y), range(P, C) → type(y, C)`
pub fn apply_range_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    for triple in delta.iter() {
        let ranges = ontology.ranges_of(&triple.predicate);
        if ranges.is_empty() {
            continue;
        }
        let Some(y) = term_as_subject(&triple.object) else {
            continue;
        };
        for class in ranges {
            let conclusion = Triple::new(y.clone(), rdf::TYPE.into_owned(), class.clone());
            emit(conclusion, derived, new_delta, diagnostics, "prp-rng");
        }
    }
}

/// prp-spo1: `P(x, y), subPropertyOf(P, Q) → Q(x, y)`
///
/// Equivalent properties are folded into the sub-property closure during
/// extraction, so this also covers prp-eqp1/2.
pub fn apply_sub_property_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    for triple in delta.iter() {
        for q in ontology.super_properties_of(&triple.predicate) {
            let conclusion = Triple::new(triple.subject.clone(), q.clone(), triple.object.clone());
            emit(conclusion, derived, new_delta, diagnostics, "prp-spo1");
        }
    }
}

/// cax-sco: `type(x, C1), subClassOf(C1, C2) → type(x, C2)`
pub fn apply_subclass_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    let rdf_type = rdf::TYPE.into_owned();
    for triple in delta.get_by_p(&rdf_type) {
        for c2 in ontology.super_classes_of(&triple.object) {
            let conclusion = Triple::new(triple.subject.clone(), rdf_type.clone(), c2.clone());
            emit(conclusion, derived, new_delta, diagnostics, "cax-sco");
        }
    }
}

/// cax-eqc1/2: `type(x, C1), equivalentClass(C1, C2) → type(x, C2)`
pub fn apply_equivalent_class_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    let rdf_type = rdf::TYPE.into_owned();
    for triple in delta.get_by_p(&rdf_type) {
        for c2 in ontology.equivalent_classes_of(&triple.object) {
            let conclusion = Triple::new(triple.subject.clone(), rdf_type.clone(), c2.clone());
            emit(conclusion, derived, new_delta, diagnostics, "cax-eqc");
        }
    }
}

/// scm-sco / scm-spo: materialize the transitive closure of the subclass
/// and subproperty hierarchies as triples.
///
/// `subClassOf(C1, C2), subClassOf(C2, C3) → subClassOf(C1, C3)`, and the
/// same for `subPropertyOf`. The closures are precomputed in the ontology,
/// so each assertion in the delta expands in one lookup.
pub fn apply_schema_rules(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    let sub_class_of = rdfs::SUB_CLASS_OF.into_owned();
    for triple in delta.get_by_p(&sub_class_of) {
        let subject_term = Term::from(triple.subject.clone());
        for c3 in ontology.super_classes_of(&triple.object) {
            if *c3 == subject_term {
                continue;
            }
            let conclusion = Triple::new(triple.subject.clone(), sub_class_of.clone(), c3.clone());
            emit(conclusion, derived, new_delta, diagnostics, "scm-sco");
        }
    }

    let sub_property_of = rdfs::SUB_PROPERTY_OF.into_owned();
    for triple in delta.get_by_p(&sub_property_of) {
        let Term::NamedNode(object) = &triple.object else {
            continue;
        };
        let subject_term = Term::from(triple.subject.clone());
        for q in ontology.super_properties_of(object) {
            let q_term = Term::from(q.clone());
            if q_term == subject_term {
                continue;
            }
            let conclusion = Triple::new(triple.subject.clone(), sub_property_of.clone(), q_term);
            emit(conclusion, derived, new_delta, diagnostics, "scm-spo");
        }
    }
}

/// prp-fp: `FunctionalProperty(P), P(x, y1), P(x, y2) → sameAs(y1, y2)`
pub fn apply_functional_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    let same_as = owl::SAME_AS.into_owned();
    for triple in delta.iter() {
        if !ontology.is_functional(&triple.predicate) {
            continue;
        }
        let Some(y1) = term_as_subject(&triple.object) else {
            continue;
        };
        let others: Vec<Term> = derived
            .get_by_ps(&triple.predicate, &triple.subject)
            .chain(delta.get_by_ps(&triple.predicate, &triple.subject))
            .map(|t| t.object.clone())
            .filter(|o| *o != triple.object && term_as_subject(o).is_some())
            .collect();
        for y2 in others {
            let conclusion = Triple::new(y1.clone(), same_as.clone(), y2);
            emit(conclusion, derived, new_delta, diagnostics, "prp-fp");
        }
    }
}

/// prp-ifp: `InverseFunctionalProperty(P), P(x1, y), P(x2, y) → sameAs(x1, x2)`
pub fn apply_inverse_functional_rule(
    ontology: &RlOntology,
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    let same_as = owl::SAME_AS.into_owned();
    for triple in delta.iter() {
        if !ontology.is_inverse_functional(&triple.predicate) {
            continue;
        }
        let others: Vec<Subject> = derived
            .get_by_po(&triple.predicate, &triple.object)
            .chain(delta.get_by_po(&triple.predicate, &triple.object))
            .map(|t| t.subject.clone())
            .filter(|s| *s != triple.subject)
            .collect();
        for x2 in others {
            let conclusion = Triple::new(
                triple.subject.clone(),
                same_as.clone(),
                Term::from(x2),
            );
            emit(conclusion, derived, new_delta, diagnostics, "prp-ifp");
        }
    }
}

/// The owl:sameAs rule family: eq-sym, eq-trans, eq-rep-s, eq-rep-o.
///
/// Both directions of each equality are materialized instead of keeping a
/// union-find canonical form, so the graph itself carries the closure.
pub fn apply_same_as_rules(
    delta: &RuleDelta,
    derived: &DerivedTriples,
    new_delta: &mut RuleDelta,
    diagnostics: &mut ReasoningDiagnostics,
) {
    let same_as = owl::SAME_AS.into_owned();

    // eq-sym / eq-trans / replication driven by new sameAs facts
    for triple in delta.get_by_p(&same_as) {
        let x = &triple.subject;
        let x_term = Term::from(x.clone());
        let Some(y) = term_as_subject(&triple.object) else {
            continue;
        };
        if x_term == triple.object {
            continue;
        }

        // eq-sym: sameAs(x, y) → sameAs(y, x)
        emit(
            Triple::new(y.clone(), same_as.clone(), x_term.clone()),
            derived,
            new_delta,
            diagnostics,
            "eq-sym",
        );

        // eq-trans: sameAs(x, y), sameAs(y, z) → sameAs(x, z)
        let continuations: Vec<Term> = derived
            .get_by_ps(&same_as, &y)
            .chain(delta.get_by_ps(&same_as, &y))
            .map(|t| t.object.clone())
            .collect();
        for z in continuations {
            emit(
                Triple::new(x.clone(), same_as.clone(), z),
                derived,
                new_delta,
                diagnostics,
                "eq-trans",
            );
        }

        // eq-rep-s: sameAs(x, y), x p o → y p o
        let facts: Vec<Triple> = derived
            .get_by_subject(x)
            .chain(delta.get_by_subject(x))
            .cloned()
            .collect();
        for fact in facts {
            emit(
                Triple::new(y.clone(), fact.predicate, fact.object),
                derived,
                new_delta,
                diagnostics,
                "eq-rep-s",
            );
        }

        // eq-rep-o: sameAs(x, y), s p x → s p y
        let facts: Vec<Triple> = derived
            .get_by_object(&x_term)
            .chain(delta.get_by_object(&x_term))
            .cloned()
            .collect();
        for fact in facts {
            emit(
                Triple::new(fact.subject, fact.predicate, triple.object.clone()),
                derived,
                new_delta,
                diagnostics,
                "eq-rep-o",
            );
        }
    }

    // replication driven by new non-sameAs facts against known equalities
    for fact in delta.iter() {
        if fact.predicate.as_ref() == owl::SAME_AS {
            continue;
        }
        // subjects equal to fact.subject
        let subject_aliases: Vec<Term> = derived
            .get_by_ps(&same_as, &fact.subject)
            .map(|t| t.object.clone())
            .collect();
        for alias in subject_aliases {
            if let Some(aliased) = term_as_subject(&alias) {
                emit(
                    Triple::new(aliased, fact.predicate.clone(), fact.object.clone()),
                    derived,
                    new_delta,
                    diagnostics,
                    "eq-rep-s",
                );
            }
        }
        // objects equal to fact.object
        if let Some(object_subject) = term_as_subject(&fact.object) {
            let object_aliases: Vec<Term> = derived
                .get_by_ps(&same_as, &object_subject)
                .map(|t| t.object.clone())
                .collect();
            for alias in object_aliases {
                emit(
                    Triple::new(fact.subject.clone(), fact.predicate.clone(), alias),
                    derived,
                    new_delta,
                    diagnostics,
                    "eq-rep-o",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn triple(s: &str, p: NamedNode, o: &str) -> Triple {
        Triple::new(node(s), p, Term::from(node(o)))
    }

    fn ontology_of(schema: &[Triple]) -> RlOntology {
        RlOntology::extract(schema)
    }

    #[test]
    fn symmetric_rule_flips_subject_and_object() {
        let ontology = ontology_of(&[Triple::new(
            node("urn:knows"),
            rdf::TYPE.into_owned(),
            Term::from(owl::SYMMETRIC_PROPERTY),
        )]);
        let mut delta = RuleDelta::new();
        delta.push(triple("urn:bob", node("urn:knows"), "urn:alice"));

        let derived = DerivedTriples::new();
        let mut new_delta = RuleDelta::new();
        let mut diagnostics = ReasoningDiagnostics::default();
        apply_symmetric_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);

        assert_eq!(new_delta.len(), 1);
        let conclusion = new_delta.iter().next().unwrap();
        assert_eq!(conclusion.subject, Subject::from(node("urn:alice")));
        assert_eq!(conclusion.object, Term::from(node("urn:bob")));
    }

    #[test]
    fn symmetric_rule_skips_literal_objects() {
        let ontology = ontology_of(&[Triple::new(
            node("urn:p"),
            rdf::TYPE.into_owned(),
            Term::from(owl::SYMMETRIC_PROPERTY),
        )]);
        let mut delta = RuleDelta::new();
        delta.push(Triple::new(
            node("urn:x"),
            node("urn:p"),
            Literal::new_simple_literal("not a resource"),
        ));

        let derived = DerivedTriples::new();
        let mut new_delta = RuleDelta::new();
        let mut diagnostics = ReasoningDiagnostics::default();
        apply_symmetric_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        assert!(new_delta.is_empty());
    }

    #[test]
    fn transitive_rule_joins_within_the_delta() {
        let ontology = ontology_of(&[Triple::new(
            node("urn:ancestor"),
            rdf::TYPE.into_owned(),
            Term::from(owl::TRANSITIVE_PROPERTY),
        )]);
        let mut delta = RuleDelta::new();
        delta.push(triple("urn:a", node("urn:ancestor"), "urn:b"));
        delta.push(triple("urn:b", node("urn:ancestor"), "urn:c"));

        let derived = DerivedTriples::new();
        let mut new_delta = RuleDelta::new();
        let mut diagnostics = ReasoningDiagnostics::default();
        apply_transitive_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);

        assert!(new_delta
            .iter()
            .any(|t| *t == triple("urn:a", node("urn:ancestor"), "urn:c")));
    }

    #[test]
    fn domain_and_range_type_both_ends() {
        let ontology = ontology_of(&[
            triple("urn:p", rdfs_domain(), "urn:C"),
            triple("urn:p", rdfs_range(), "urn:D"),
        ]);
        let mut delta = RuleDelta::new();
        delta.push(triple("urn:x", node("urn:p"), "urn:y"));

        let derived = DerivedTriples::new();
        let mut new_delta = RuleDelta::new();
        let mut diagnostics = ReasoningDiagnostics::default();
        apply_domain_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        apply_range_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);

        assert!(new_delta
            .iter()
            .any(|t| *t == triple("urn:x", rdf::TYPE.into_owned(), "urn:C")));
        assert!(new_delta
            .iter()
            .any(|t| *t == triple("urn:y", rdf::TYPE.into_owned(), "urn:D")));
    }

    #[test]
    fn functional_rule_equates_objects() {
        let ontology = ontology_of(&[Triple::new(
            node("urn:mother"),
            rdf::TYPE.into_owned(),
            Term::from(owl::FUNCTIONAL_PROPERTY),
        )]);
        let mut derived = DerivedTriples::new();
        derived.try_add(triple("urn:x", node("urn:mother"), "urn:m1"));

        let mut delta = RuleDelta::new();
        delta.push(triple("urn:x", node("urn:mother"), "urn:m2"));

        let mut new_delta = RuleDelta::new();
        let mut diagnostics = ReasoningDiagnostics::default();
        apply_functional_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);

        assert!(new_delta
            .iter()
            .any(|t| *t == triple("urn:m2", owl::SAME_AS.into_owned(), "urn:m1")));
    }

    #[test]
    fn same_as_rules_replicate_facts() {
        let mut derived = DerivedTriples::new();
        derived.try_add(triple("urn:a", node("urn:p"), "urn:o"));

        let mut delta = RuleDelta::new();
        delta.push(triple("urn:a", owl::SAME_AS.into_owned(), "urn:b"));

        let mut new_delta = RuleDelta::new();
        let mut diagnostics = ReasoningDiagnostics::default();
        apply_same_as_rules(&delta, &derived, &mut new_delta, &mut diagnostics);

        // eq-sym
        assert!(new_delta
            .iter()
            .any(|t| *t == triple("urn:b", owl::SAME_AS.into_owned(), "urn:a")));
        // eq-rep-s
        assert!(new_delta
            .iter()
            .any(|t| *t == triple("urn:b", node("urn:p"), "urn:o")));
        // no reflexive sameAs
        assert!(!new_delta
            .iter()
            .any(|t| t.predicate.as_ref() == owl::SAME_AS
                && Term::from(t.subject.clone()) == t.object));
    }

    fn rdfs_domain() -> NamedNode {
        oxrdf::vocab::rdfs::DOMAIN.into_owned()
    }

    fn rdfs_range() -> NamedNode {
        oxrdf::vocab::rdfs::RANGE.into_owned()
    }
}
