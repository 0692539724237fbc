//! SPARQL support for pythinfer.
//!
//! Queries are parsed to algebra with `spargebra` once, at load time, and
//! validated against the subset the evaluator implements so a heuristic
//! with an unsupported construct fails before inference starts, naming the
//! construct. Evaluation runs against a [`TripleIndex`] snapshot of
//! whatever view the caller is working over.

pub mod error;
pub mod eval;

pub use error::{Result, SparqlError};
pub use eval::{Binding, TripleIndex};

use oxrdf::{Term, Triple, Variable};
use spargebra::algebra::{Expression, GraphPattern};
use spargebra::Query;

/// Which SPARQL query form a parsed query is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    Select,
    Construct,
    Ask,
    Describe,
}

impl QueryForm {
    fn name(self) -> &'static str {
        match self {
            QueryForm::Select => "SELECT",
            QueryForm::Construct => "CONSTRUCT",
            QueryForm::Ask => "ASK",
            QueryForm::Describe => "DESCRIBE",
        }
    }
}

/// Result of evaluating a query.
#[derive(Debug)]
pub enum QueryOutcome {
    /// SELECT: projected variable names and one row per solution.
    Solutions {
        variables: Vec<String>,
        rows: Vec<Vec<Option<Term>>>,
    },
    /// ASK.
    Boolean(bool),
    /// CONSTRUCT.
    Graph(Vec<Triple>),
}

/// A named, parsed, validated SPARQL query.
#[derive(Debug, Clone)]
pub struct SparqlQuery {
    name: String,
    query: Query,
}

impl SparqlQuery {
    /// Parse and validate a query. The name is used in diagnostics (for
    /// file-loaded heuristics it is the file stem).
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let query = Query::parse(text, None).map_err(|source| SparqlError::Syntax {
            name: name.clone(),
            source,
        })?;
        let pattern = match &query {
            Query::Select { pattern, .. }
            | Query::Construct { pattern, .. }
            | Query::Ask { pattern, .. } => pattern,
            Query::Describe { .. } => {
                return Err(SparqlError::Unsupported {
                    name,
                    construct: "DESCRIBE".to_owned(),
                })
            }
        };
        if let Some(construct) = unsupported_in_pattern(pattern) {
            return Err(SparqlError::Unsupported { name, construct });
        }
        Ok(Self { name, query })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn form(&self) -> QueryForm {
        match &self.query {
            Query::Select { .. } => QueryForm::Select,
            Query::Construct { .. } => QueryForm::Construct,
            Query::Ask { .. } => QueryForm::Ask,
            Query::Describe { .. } => QueryForm::Describe,
        }
    }

    /// Evaluate a CONSTRUCT query, returning the instantiated triples.
    pub fn construct(&self, index: &TripleIndex) -> Result<Vec<Triple>> {
        let Query::Construct {
            template, pattern, ..
        } = &self.query
        else {
            return Err(SparqlError::WrongForm {
                name: self.name.clone(),
                expected: "CONSTRUCT",
                found: self.form().name(),
            });
        };
        let solutions = eval::eval_pattern(pattern, index, vec![Binding::default()]);
        Ok(eval::instantiate_template(template, &solutions))
    }

    /// Evaluate any supported query form.
    pub fn evaluate(&self, index: &TripleIndex) -> Result<QueryOutcome> {
        match &self.query {
            Query::Construct { .. } => Ok(QueryOutcome::Graph(self.construct(index)?)),
            Query::Ask { pattern, .. } => {
                let solutions = eval::eval_pattern(pattern, index, vec![Binding::default()]);
                Ok(QueryOutcome::Boolean(!solutions.is_empty()))
            }
            Query::Select { pattern, .. } => {
                let solutions = eval::eval_pattern(pattern, index, vec![Binding::default()]);
                let variables = projected_variables(pattern).unwrap_or_else(|| {
                    let mut names: Vec<String> = solutions
                        .iter()
                        .flat_map(|row| row.keys().cloned())
                        .filter(|name| !name.starts_with("_:"))
                        .collect();
                    names.sort();
                    names.dedup();
                    names
                });
                let rows = solutions
                    .iter()
                    .map(|row| variables.iter().map(|v| row.get(v).cloned()).collect())
                    .collect();
                Ok(QueryOutcome::Solutions { variables, rows })
            }
            Query::Describe { .. } => Err(SparqlError::Unsupported {
                name: self.name.clone(),
                construct: "DESCRIBE".to_owned(),
            }),
        }
    }
}

/// The projection variables of the outermost SELECT, when present.
fn projected_variables(pattern: &GraphPattern) -> Option<Vec<String>> {
    match pattern {
        GraphPattern::Project { variables, .. } => {
            Some(variables.iter().map(|v: &Variable| v.as_str().to_owned()).collect())
        }
        GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => projected_variables(inner),
        _ => None,
    }
}

/// First unsupported construct in a pattern, if any.
fn unsupported_in_pattern(pattern: &GraphPattern) -> Option<String> {
    match pattern {
        GraphPattern::Bgp { .. } | GraphPattern::Values { .. } => None,
        GraphPattern::Join { left, right } | GraphPattern::Union { left, right } => {
            unsupported_in_pattern(left).or_else(|| unsupported_in_pattern(right))
        }
        GraphPattern::Filter { expr, inner } => {
            unsupported_in_expression(expr).or_else(|| unsupported_in_pattern(inner))
        }
        GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => unsupported_in_pattern(inner),
        GraphPattern::Path { .. } => Some("property paths".to_owned()),
        GraphPattern::LeftJoin { .. } => Some("OPTIONAL".to_owned()),
        GraphPattern::Minus { .. } => Some("MINUS".to_owned()),
        GraphPattern::Graph { .. } => Some("GRAPH".to_owned()),
        GraphPattern::Extend { .. } => Some("BIND".to_owned()),
        GraphPattern::OrderBy { .. } => Some("ORDER BY".to_owned()),
        GraphPattern::Group { .. } => Some("GROUP BY / aggregation".to_owned()),
        GraphPattern::Service { .. } => Some("SERVICE".to_owned()),
        _ => Some("extension".to_owned()),
    }
}

fn unsupported_in_expression(expr: &Expression) -> Option<String> {
    match expr {
        Expression::NamedNode(_)
        | Expression::Literal(_)
        | Expression::Variable(_)
        | Expression::Bound(_) => None,
        Expression::Or(a, b)
        | Expression::And(a, b)
        | Expression::Equal(a, b)
        | Expression::SameTerm(a, b)
        | Expression::Greater(a, b)
        | Expression::GreaterOrEqual(a, b)
        | Expression::Less(a, b)
        | Expression::LessOrEqual(a, b)
        | Expression::Add(a, b)
        | Expression::Subtract(a, b)
        | Expression::Multiply(a, b)
        | Expression::Divide(a, b) => {
            unsupported_in_expression(a).or_else(|| unsupported_in_expression(b))
        }
        Expression::UnaryPlus(a) | Expression::UnaryMinus(a) | Expression::Not(a) => {
            unsupported_in_expression(a)
        }
        Expression::In(needle, haystack) => unsupported_in_expression(needle)
            .or_else(|| haystack.iter().find_map(unsupported_in_expression)),
        Expression::If(a, b, c) => unsupported_in_expression(a)
            .or_else(|| unsupported_in_expression(b))
            .or_else(|| unsupported_in_expression(c)),
        Expression::Coalesce(candidates) => candidates.iter().find_map(unsupported_in_expression),
        Expression::Exists(_) => Some("EXISTS".to_owned()),
        Expression::FunctionCall(function, _) => Some(format!("function {function}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn knows() -> NamedNode {
        node("http://xmlns.com/foaf/0.1/knows")
    }

    fn age() -> NamedNode {
        node("http://xmlns.com/foaf/0.1/age")
    }

    fn people_index() -> TripleIndex {
        let alice = node("urn:alice");
        let bob = node("urn:bob");
        TripleIndex::new([
            Triple::new(
                alice.clone(),
                age(),
                Literal::new_typed_literal("30", oxrdf::vocab::xsd::INTEGER),
            ),
            Triple::new(alice.clone(), knows(), Term::from(bob.clone())),
            Triple::new(
                bob.clone(),
                age(),
                Literal::new_typed_literal("12", oxrdf::vocab::xsd::INTEGER),
            ),
            Triple::new(bob, knows(), Term::from(alice)),
        ])
    }

    #[test]
    fn construct_with_filter_joins_and_compares() {
        let query = SparqlQuery::parse(
            "celebrity",
            r#"
            PREFIX foaf: <http://xmlns.com/foaf/0.1/>
            CONSTRUCT { ?x foaf:knows <urn:jamiroquai> }
            WHERE {
                ?x foaf:age ?age ;
                   foaf:knows <urn:bob> .
                FILTER(?age > 29)
            }
            "#,
        )
        .unwrap();
        assert_eq!(query.form(), QueryForm::Construct);

        let triples = query.construct(&people_index()).unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(
            triples[0],
            Triple::new(node("urn:alice"), knows(), Term::from(node("urn:jamiroquai")))
        );
    }

    #[test]
    fn filter_excludes_non_matching_rows() {
        let query = SparqlQuery::parse(
            "adults",
            r#"
            PREFIX foaf: <http://xmlns.com/foaf/0.1/>
            SELECT ?x WHERE { ?x foaf:age ?age . FILTER(?age >= 18) }
            "#,
        )
        .unwrap();
        let QueryOutcome::Solutions { variables, rows } =
            query.evaluate(&people_index()).unwrap()
        else {
            panic!("expected solutions");
        };
        assert_eq!(variables, vec!["x"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Some(Term::from(node("urn:alice"))));
    }

    #[test]
    fn ask_reports_existence() {
        let query = SparqlQuery::parse(
            "anyone",
            "ASK { ?x <http://xmlns.com/foaf/0.1/knows> ?y }",
        )
        .unwrap();
        let QueryOutcome::Boolean(found) = query.evaluate(&people_index()).unwrap() else {
            panic!("expected boolean");
        };
        assert!(found);

        let query = SparqlQuery::parse("nobody", "ASK { ?x <urn:nope> ?y }").unwrap();
        let QueryOutcome::Boolean(found) = query.evaluate(&people_index()).unwrap() else {
            panic!("expected boolean");
        };
        assert!(!found);
    }

    #[test]
    fn unsupported_constructs_are_rejected_at_load() {
        let err = SparqlQuery::parse(
            "optional",
            "SELECT ?x WHERE { ?x ?p ?y OPTIONAL { ?y ?q ?z } }",
        )
        .unwrap_err();
        assert!(matches!(err, SparqlError::Unsupported { ref construct, .. }
            if construct == "OPTIONAL"));
    }

    #[test]
    fn syntax_errors_carry_the_query_name() {
        let err = SparqlQuery::parse("broken", "SELECT WHERE {").unwrap_err();
        assert!(matches!(err, SparqlError::Syntax { ref name, .. } if name == "broken"));
    }

    #[test]
    fn construct_on_select_is_a_wrong_form_error() {
        let query = SparqlQuery::parse("sel", "SELECT ?x WHERE { ?x ?p ?o }").unwrap();
        let err = query.construct(&people_index()).unwrap_err();
        assert!(matches!(err, SparqlError::WrongForm { .. }));
    }

    #[test]
    fn union_merges_both_branches() {
        let query = SparqlQuery::parse(
            "union",
            r#"
            PREFIX foaf: <http://xmlns.com/foaf/0.1/>
            SELECT ?x WHERE {
                { ?x foaf:age "30"^^<http://www.w3.org/2001/XMLSchema#integer> }
                UNION
                { ?x foaf:age "12"^^<http://www.w3.org/2001/XMLSchema#integer> }
            }
            "#,
        )
        .unwrap();
        let QueryOutcome::Solutions { rows, .. } = query.evaluate(&people_index()).unwrap()
        else {
            panic!("expected solutions");
        };
        assert_eq!(rows.len(), 2);
    }
}
