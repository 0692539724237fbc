//! The quad store: named graphs of triples plus a category index.

use std::fmt;

use oxrdf::{GraphName, NamedNode, Quad, Subject, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Result, StoreError};

/// Provenance category of a named graph.
///
/// Assigned when the graph is created and write-once afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Vocabulary used only to drive inference, excluded from output.
    Reference,
    /// User-maintained data and ontology, retained in output.
    Local,
    /// Graphs the pipeline itself creates (inference output, scratch).
    Derived,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Reference => write!(f, "reference"),
            Category::Local => write!(f, "local"),
            Category::Derived => write!(f, "derived"),
        }
    }
}

/// In-memory set of quads, indexed graph-first.
///
/// Every triple belongs to exactly one named graph; there is no default
/// graph and no default-union semantics. One store instance spans one
/// pipeline run.
#[derive(Debug, Default)]
pub struct QuadStore {
    graphs: FxHashMap<GraphName, FxHashSet<Triple>>,
    categories: FxHashMap<GraphName, Category>,
}

impl QuadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a graph under a category, creating it empty if missing.
    ///
    /// Idempotent when the category matches; re-registering under a
    /// different category is a [`StoreError::CategoryConflict`].
    pub fn create_graph(&mut self, name: GraphName, category: Category) -> Result<()> {
        if let Some(existing) = self.categories.get(&name) {
            if *existing != category {
                return Err(StoreError::CategoryConflict {
                    graph: name,
                    existing: *existing,
                    requested: category,
                });
            }
            return Ok(());
        }
        self.categories.insert(name.clone(), category);
        self.graphs.entry(name).or_default();
        Ok(())
    }

    /// Insert a quad. Returns `true` if it was new.
    ///
    /// A quad addressed at an unregistered graph auto-creates that graph
    /// with category [`Category::Derived`].
    pub fn insert(&mut self, quad: Quad) -> bool {
        let Quad {
            subject,
            predicate,
            object,
            graph_name,
        } = quad;
        self.categories
            .entry(graph_name.clone())
            .or_insert(Category::Derived);
        self.graphs
            .entry(graph_name)
            .or_default()
            .insert(Triple::new(subject, predicate, object))
    }

    /// Remove a quad. No-op (returns `false`) if absent.
    pub fn remove(&mut self, quad: &Quad) -> bool {
        let triple = Triple::new(
            quad.subject.clone(),
            quad.predicate.clone(),
            quad.object.clone(),
        );
        self.graphs
            .get_mut(&quad.graph_name)
            .is_some_and(|g| g.remove(&triple))
    }

    /// Insert a batch of quads, returning how many were actually new.
    pub fn bulk_insert(&mut self, quads: impl IntoIterator<Item = Quad>) -> usize {
        quads.into_iter().filter(|q| self.insert(q.clone())).count()
    }

    /// Whether the exact quad (triple in that specific graph) is present.
    pub fn contains(&self, quad: &Quad) -> bool {
        let triple = Triple::new(
            quad.subject.clone(),
            quad.predicate.clone(),
            quad.object.clone(),
        );
        self.contains_triple_in(&triple, &quad.graph_name)
    }

    /// Whether the triple is present in the given graph.
    pub fn contains_triple_in(&self, triple: &Triple, graph: &GraphName) -> bool {
        self.graphs.get(graph).is_some_and(|g| g.contains(triple))
    }

    /// Category of a graph, if registered.
    pub fn category(&self, name: &GraphName) -> Option<Category> {
        self.categories.get(name).copied()
    }

    /// Graph names in a category, sorted by IRI for deterministic staging.
    pub fn graphs_in_category(&self, category: Category) -> Vec<GraphName> {
        let mut names: Vec<GraphName> = self
            .categories
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(n, _)| n.clone())
            .collect();
        names.sort_by_cached_key(|n| n.to_string());
        names
    }

    /// All graph names known to the store.
    pub fn graph_names(&self) -> impl Iterator<Item = &GraphName> {
        self.graphs.keys()
    }

    /// Number of triples in one graph (0 when missing).
    pub fn graph_len(&self, name: &GraphName) -> usize {
        self.graphs.get(name).map_or(0, FxHashSet::len)
    }

    /// Total number of triples across all graphs.
    ///
    /// This is the count the fixed-point driver compares between rounds, so
    /// it counts per-graph membership, not distinct triples.
    pub fn len(&self) -> usize {
        self.graphs.values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the triples of one graph (empty iterator when missing).
    pub fn graph_triples(&self, name: &GraphName) -> impl Iterator<Item = &Triple> {
        self.graphs.get(name).into_iter().flatten()
    }

    /// Drop a graph with its triples and category registration.
    ///
    /// Returns `false` when the graph did not exist. After removal the name
    /// may be re-created under any category.
    pub fn remove_graph(&mut self, name: &GraphName) -> bool {
        let existed = self.graphs.remove(name).is_some();
        self.categories.remove(name);
        existed
    }

    /// Quads matching an `(s?, p?, o?, g?)` pattern.
    pub fn quads_matching<'a>(
        &'a self,
        subject: Option<&'a Subject>,
        predicate: Option<&'a NamedNode>,
        object: Option<&'a Term>,
        graph: Option<&'a GraphName>,
    ) -> impl Iterator<Item = Quad> + 'a {
        self.graphs
            .iter()
            .filter(move |(name, _)| graph.is_none_or(|g| g == *name))
            .flat_map(move |(name, triples)| {
                triples
                    .iter()
                    .filter(move |t| matches_pattern(t, subject, predicate, object))
                    .map(|t| quad_in(t, name))
            })
    }

    /// Quads of graph `a` whose triple does not occur in graph `b`.
    ///
    /// The comparison is by triple, so `b`'s own graph name is irrelevant.
    pub fn difference<'a>(
        &'a self,
        a: &'a GraphName,
        b: &'a GraphName,
    ) -> impl Iterator<Item = Quad> + 'a {
        let exclude = self.graphs.get(b);
        self.graph_triples(a)
            .filter(move |t| !exclude.is_some_and(|g| g.contains(*t)))
            .map(move |t| quad_in(t, a))
    }

    /// All quads in the store.
    pub fn iter(&self) -> impl Iterator<Item = Quad> + '_ {
        self.graphs
            .iter()
            .flat_map(|(name, triples)| triples.iter().map(move |t| quad_in(t, name)))
    }
}

/// Whether a triple matches an `(s?, p?, o?)` pattern.
pub(crate) fn matches_pattern(
    triple: &Triple,
    subject: Option<&Subject>,
    predicate: Option<&NamedNode>,
    object: Option<&Term>,
) -> bool {
    subject.is_none_or(|s| s == &triple.subject)
        && predicate.is_none_or(|p| p == &triple.predicate)
        && object.is_none_or(|o| o == &triple.object)
}

/// Rebuild an owned quad from a triple and the graph it lives in.
pub(crate) fn quad_in(triple: &Triple, graph: &GraphName) -> Quad {
    Quad::new(
        triple.subject.clone(),
        triple.predicate.clone(),
        triple.object.clone(),
        graph.clone(),
    )
}
