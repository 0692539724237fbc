//! Restricted multi-graph views over a [`QuadStore`].

use oxrdf::{GraphName, NamedNode, Quad, Subject, Term, Triple};
use rustc_hash::FxHashSet;

use crate::error::{Result, StoreError};
use crate::store::{matches_pattern, quad_in, QuadStore};

/// A capability-restricted handle onto a quad store.
///
/// The view exposes the store's operations, but every graph access is
/// checked against a whitelist fixed at construction. Access to any other
/// graph fails with [`StoreError::PermissionDenied`]; mutation through a
/// read-only view fails with [`StoreError::ReadOnly`]. Reads that do not
/// name a graph return the deduplicated union over the whitelisted graphs,
/// never anything else.
///
/// Views are cheap: they borrow the store and copy only the whitelist.
#[derive(Debug)]
pub struct RestrictedView<'a> {
    store: &'a mut QuadStore,
    whitelist: FxHashSet<GraphName>,
    read_only: bool,
}

impl<'a> RestrictedView<'a> {
    /// A writable view over the given graphs.
    pub fn new(
        store: &'a mut QuadStore,
        whitelist: impl IntoIterator<Item = GraphName>,
    ) -> Self {
        Self {
            store,
            whitelist: whitelist.into_iter().collect(),
            read_only: false,
        }
    }

    /// A read-only view over the given graphs.
    pub fn read_only(
        store: &'a mut QuadStore,
        whitelist: impl IntoIterator<Item = GraphName>,
    ) -> Self {
        Self {
            store,
            whitelist: whitelist.into_iter().collect(),
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The whitelisted graph names (membership fixed at construction).
    pub fn whitelist(&self) -> impl Iterator<Item = &GraphName> {
        self.whitelist.iter()
    }

    pub fn is_visible(&self, graph: &GraphName) -> bool {
        self.whitelist.contains(graph)
    }

    fn check_visible(&self, graph: &GraphName) -> Result<()> {
        if self.is_visible(graph) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                graph: graph.clone(),
            })
        }
    }

    fn check_writable(&self, graph: &GraphName, operation: &'static str) -> Result<()> {
        self.check_visible(graph)?;
        if self.read_only {
            return Err(StoreError::ReadOnly {
                operation,
                graph: graph.clone(),
            });
        }
        Ok(())
    }

    /// Insert a quad into a whitelisted graph.
    ///
    /// Inserting into a whitelisted graph that holds no triples yet is what
    /// creates that graph in the underlying store.
    pub fn insert(&mut self, quad: Quad) -> Result<bool> {
        self.check_writable(&quad.graph_name, "insert")?;
        Ok(self.store.insert(quad))
    }

    /// Remove a quad from a whitelisted graph. No-op when absent.
    pub fn remove(&mut self, quad: &Quad) -> Result<bool> {
        self.check_writable(&quad.graph_name, "remove")?;
        Ok(self.store.remove(quad))
    }

    /// Insert a batch of quads; all graph names are checked before any
    /// mutation so a violation leaves the store untouched.
    pub fn bulk_insert(&mut self, quads: Vec<Quad>) -> Result<usize> {
        for quad in &quads {
            self.check_writable(&quad.graph_name, "insert")?;
        }
        Ok(self.store.bulk_insert(quads))
    }

    /// Remove a whitelisted graph from the store.
    ///
    /// The name stays in the whitelist, so the graph may be re-created by a
    /// later insert through this view.
    pub fn remove_graph(&mut self, graph: &GraphName) -> Result<bool> {
        self.check_writable(graph, "remove graph")?;
        Ok(self.store.remove_graph(graph))
    }

    /// Whether the exact quad is present. The quad's graph must be visible.
    pub fn contains(&self, quad: &Quad) -> Result<bool> {
        self.check_visible(&quad.graph_name)?;
        Ok(self.store.contains(quad))
    }

    /// Whether any whitelisted graph holds this triple.
    pub fn contains_triple(&self, triple: &Triple) -> bool {
        self.whitelist
            .iter()
            .any(|g| self.store.contains_triple_in(triple, g))
    }

    /// Triples matching `(s?, p?, o?)` in one named graph.
    pub fn triples_in(
        &self,
        graph: &GraphName,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Result<Vec<Triple>> {
        self.check_visible(graph)?;
        Ok(self
            .store
            .graph_triples(graph)
            .filter(|t| matches_pattern(t, subject, predicate, object))
            .cloned()
            .collect())
    }

    /// Triples matching `(s?, p?, o?)` across the whitelist, deduplicated.
    pub fn triples(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Vec<Triple> {
        let mut seen: FxHashSet<&Triple> = FxHashSet::default();
        for graph in &self.whitelist {
            for triple in self.store.graph_triples(graph) {
                if matches_pattern(triple, subject, predicate, object) {
                    seen.insert(triple);
                }
            }
        }
        seen.into_iter().cloned().collect()
    }

    /// Quads matching `(s?, p?, o?, g?)`; a named graph must be visible,
    /// otherwise the union over the whitelist is searched.
    pub fn quads(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        graph: Option<&GraphName>,
    ) -> Result<Vec<Quad>> {
        if let Some(g) = graph {
            self.check_visible(g)?;
        }
        Ok(self
            .whitelist
            .iter()
            .filter(|name| graph.is_none_or(|g| g == *name))
            .flat_map(|name| {
                self.store
                    .graph_triples(name)
                    .filter(|t| matches_pattern(t, subject, predicate, object))
                    .map(move |t| quad_in(t, name))
            })
            .collect())
    }

    /// All quads in the whitelisted graphs.
    pub fn iter(&self) -> impl Iterator<Item = Quad> + '_ {
        self.whitelist.iter().flat_map(|name| {
            self.store
                .graph_triples(name)
                .map(move |t| quad_in(t, name))
        })
    }

    /// Number of distinct triples visible through the view.
    pub fn len(&self) -> usize {
        if self.whitelist.len() == 1 {
            // fast path: a single graph cannot hold duplicates
            return self
                .whitelist
                .iter()
                .map(|g| self.store.graph_len(g))
                .sum();
        }
        let mut seen: FxHashSet<&Triple> = FxHashSet::default();
        for graph in &self.whitelist {
            seen.extend(self.store.graph_triples(graph));
        }
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.whitelist
            .iter()
            .all(|g| self.store.graph_len(g) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Category;
    use oxrdf::NamedNode;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn graph(iri: &str) -> GraphName {
        node(iri).into()
    }

    fn quad(s: &str, p: &str, o: &str, g: &str) -> Quad {
        Quad::new(node(s), node(p), Term::from(node(o)), graph(g))
    }

    fn seeded_store() -> QuadStore {
        let mut store = QuadStore::new();
        store.create_graph(graph("urn:a"), Category::Local).unwrap();
        store.create_graph(graph("urn:b"), Category::Local).unwrap();
        store.insert(quad("urn:s1", "urn:p", "urn:o", "urn:a"));
        store.insert(quad("urn:s2", "urn:p", "urn:o", "urn:b"));
        // duplicate triple across both graphs
        store.insert(quad("urn:shared", "urn:p", "urn:o", "urn:a"));
        store.insert(quad("urn:shared", "urn:p", "urn:o", "urn:b"));
        store
    }

    #[test]
    fn read_outside_whitelist_is_denied() {
        let mut store = seeded_store();
        let view = RestrictedView::new(&mut store, [graph("urn:a")]);
        let err = view
            .triples_in(&graph("urn:b"), None, None, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
    }

    #[test]
    fn write_outside_whitelist_is_denied_without_mutation() {
        let mut store = seeded_store();
        let before = store.len();
        {
            let mut view = RestrictedView::new(&mut store, [graph("urn:a")]);
            let err = view
                .insert(quad("urn:x", "urn:p", "urn:o", "urn:b"))
                .unwrap_err();
            assert!(matches!(err, StoreError::PermissionDenied { .. }));
        }
        assert_eq!(store.len(), before);
    }

    #[test]
    fn bulk_insert_rejects_whole_batch_on_violation() {
        let mut store = seeded_store();
        let before = store.len();
        {
            let mut view = RestrictedView::new(&mut store, [graph("urn:a")]);
            let quads = vec![
                quad("urn:x", "urn:p", "urn:o", "urn:a"),
                quad("urn:y", "urn:p", "urn:o", "urn:b"),
            ];
            assert!(view.bulk_insert(quads).is_err());
        }
        assert_eq!(store.len(), before);
    }

    #[test]
    fn read_only_view_rejects_mutation() {
        let mut store = seeded_store();
        let mut view = RestrictedView::read_only(&mut store, [graph("urn:a")]);
        let err = view
            .insert(quad("urn:x", "urn:p", "urn:o", "urn:a"))
            .unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly { .. }));
    }

    #[test]
    fn union_iteration_deduplicates_by_triple() {
        let mut store = seeded_store();
        let view = RestrictedView::new(&mut store, [graph("urn:a"), graph("urn:b")]);
        // s1, s2, shared: the shared triple appears in both graphs but is
        // one distinct triple
        assert_eq!(view.len(), 3);
        assert_eq!(view.triples(None, None, None).len(), 3);
        // raw quad iteration keeps provenance, so it yields 4
        assert_eq!(view.iter().count(), 4);
    }

    #[test]
    fn union_iteration_never_leaks_hidden_graphs() {
        let mut store = seeded_store();
        let view = RestrictedView::new(&mut store, [graph("urn:a")]);
        let triples = view.triples(None, None, None);
        assert_eq!(triples.len(), 2);
        assert!(triples
            .iter()
            .all(|t| t.subject != Subject::from(node("urn:s2"))));
    }

    #[test]
    fn insert_into_empty_whitelisted_graph_creates_it() {
        let mut store = QuadStore::new();
        {
            let mut view = RestrictedView::new(&mut store, [graph("urn:new")]);
            view.insert(quad("urn:s", "urn:p", "urn:o", "urn:new"))
                .unwrap();
        }
        assert_eq!(store.graph_len(&graph("urn:new")), 1);
        assert_eq!(store.category(&graph("urn:new")), Some(Category::Derived));
    }

    #[test]
    fn removed_graph_stays_whitelisted_and_can_be_recreated() {
        let mut store = seeded_store();
        let mut view = RestrictedView::new(&mut store, [graph("urn:a")]);
        assert!(view.remove_graph(&graph("urn:a")).unwrap());
        assert!(view.is_visible(&graph("urn:a")));
        view.insert(quad("urn:s", "urn:p", "urn:o", "urn:a"))
            .unwrap();
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn quads_with_named_graph_only_search_that_graph() {
        let mut store = seeded_store();
        let view = RestrictedView::new(&mut store, [graph("urn:a"), graph("urn:b")]);
        let hits = view
            .quads(None, None, None, Some(&graph("urn:a")))
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|q| q.graph_name == graph("urn:a")));
    }
}
