//! Semi-naive fixpoint for the in-process RL backend.
//!
//! Seeds the delta with every input triple, then applies the rule set until
//! no rule produces anything new (or the fact budget trips). The result is
//! the entailment delta: triples derived but not among the inputs.

use oxrdf::Triple;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::delta::{DerivedTriples, RuleDelta};
use crate::ontology::RlOntology;
use crate::rules;
use crate::ReasoningDiagnostics;

/// Caps for one closure computation.
///
/// Closure size is bounded by the Herbrand base, but a malformed ontology
/// can still make that bound enormous; the fact budget turns runaway
/// materialization into a warning instead of an OOM.
#[derive(Debug, Clone)]
pub struct ReasoningBudget {
    pub max_facts: usize,
}

impl Default for ReasoningBudget {
    fn default() -> Self {
        Self {
            max_facts: 1_000_000,
        }
    }
}

/// Compute the RL closure delta over a set of base triples.
///
/// Returns the derived triples that are not in the base set, plus
/// per-rule diagnostics.
pub fn compute_closure(
    base: &[Triple],
    budget: &ReasoningBudget,
) -> (Vec<Triple>, ReasoningDiagnostics) {
    let mut diagnostics = ReasoningDiagnostics::default();
    let ontology = RlOntology::extract(base);

    let base_set: FxHashSet<&Triple> = base.iter().collect();
    let has_same_as = base
        .iter()
        .any(|t| t.predicate.as_ref() == pythinfer_vocab::owl::SAME_AS);
    if ontology.is_empty() && !has_same_as {
        debug!("no RL schema assertions found, nothing to derive");
        return (Vec::new(), diagnostics);
    }

    let mut derived = DerivedTriples::new();
    let mut delta = RuleDelta::new();
    for triple in base {
        delta.push(triple.clone());
    }

    while !delta.is_empty() {
        if derived.len() > budget.max_facts {
            warn!(
                facts = derived.len(),
                max = budget.max_facts,
                "reasoning capped by fact budget"
            );
            diagnostics.capped = true;
            break;
        }
        diagnostics.rounds += 1;
        let mut new_delta = RuleDelta::new();

        // identity-producing rules first so equalities exist before the
        // replication pass sees the round's facts
        rules::apply_functional_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_inverse_functional_rule(
            &ontology,
            &delta,
            &derived,
            &mut new_delta,
            &mut diagnostics,
        );
        rules::apply_same_as_rules(&delta, &derived, &mut new_delta, &mut diagnostics);

        rules::apply_symmetric_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_transitive_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_inverse_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_domain_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_range_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_sub_property_rule(
            &ontology,
            &delta,
            &derived,
            &mut new_delta,
            &mut diagnostics,
        );
        rules::apply_subclass_rule(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_schema_rules(&ontology, &delta, &derived, &mut new_delta, &mut diagnostics);
        rules::apply_equivalent_class_rule(
            &ontology,
            &delta,
            &derived,
            &mut new_delta,
            &mut diagnostics,
        );

        // merge this round's delta, then keep only genuinely new facts
        for triple in delta.iter() {
            derived.try_add(triple.clone());
        }
        let mut filtered = RuleDelta::new();
        for triple in new_delta.iter() {
            if derived.try_add(triple.clone()) {
                filtered.push(triple.clone());
            }
        }
        delta = filtered;
    }

    let entailed: Vec<Triple> = derived
        .into_triples()
        .into_iter()
        .filter(|t| !base_set.contains(t))
        .collect();
    diagnostics.facts_derived = entailed.len();
    debug!(
        rounds = diagnostics.rounds,
        derived = diagnostics.facts_derived,
        "closure complete"
    );
    (entailed, diagnostics)
}
