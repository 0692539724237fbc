//! RDF vocabulary constants and well-known graph IRIs for pythinfer.
//!
//! This crate provides a centralized location for the vocabulary IRIs the
//! inference pipeline needs beyond what `oxrdf::vocab` ships, plus the
//! synthetic graph names used for derived artifacts.
//!
//! # Organization
//!
//! - `owl` - OWL vocabulary (http://www.w3.org/2002/07/owl#)
//! - `graphs` - synthetic graph IRIs for inference output graphs

/// OWL vocabulary constants
pub mod owl {
    use oxrdf::NamedNodeRef;

    /// owl:Thing, the class of all individuals
    pub const THING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Thing");

    /// owl:Nothing, the empty class
    pub const NOTHING: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Nothing");

    /// owl:Class
    pub const CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");

    /// owl:sameAs
    pub const SAME_AS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#sameAs");

    /// owl:equivalentClass
    pub const EQUIVALENT_CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentClass");

    /// owl:equivalentProperty
    pub const EQUIVALENT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#equivalentProperty");

    /// owl:inverseOf
    pub const INVERSE_OF: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#inverseOf");

    /// owl:SymmetricProperty
    pub const SYMMETRIC_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#SymmetricProperty");

    /// owl:TransitiveProperty
    pub const TRANSITIVE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#TransitiveProperty");

    /// owl:FunctionalProperty
    pub const FUNCTIONAL_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#FunctionalProperty");

    /// owl:InverseFunctionalProperty
    pub const INVERSE_FUNCTIONAL_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#InverseFunctionalProperty");

    /// owl:ObjectProperty
    pub const OBJECT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");

    /// owl:DatatypeProperty
    pub const DATATYPE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#DatatypeProperty");
}

/// Synthetic graph IRIs for inference output graphs and exported artifacts.
///
/// Input graphs are named by the `file://` IRI of their source path; graphs
/// the pipeline itself creates use stable `urn:pythinfer:derived:` names so
/// they can never collide with an input file.
pub mod graphs {
    use oxrdf::NamedNodeRef;

    /// Entailments computed from reference graphs alone (the "noise floor").
    pub const INFERENCES_EXTERNAL_OWL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("urn:pythinfer:derived:inferences_external_owl");

    /// Entailments computed over the full dataset, accumulated per round.
    pub const INFERENCES_FULL_OWL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("urn:pythinfer:derived:inferences_full_owl");

    /// Triples produced by SPARQL and procedural heuristics.
    pub const INFERENCES_HEURISTIC: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("urn:pythinfer:derived:inferences_heuristic");
}
