//! Pattern-matching evaluation over an indexed triple set.
//!
//! This is the join engine behind heuristic CONSTRUCT queries and the CLI
//! `query` verb. It evaluates the algebra subset the loader admits
//! (BGP joins, FILTER, UNION, projection, DISTINCT/REDUCED, VALUES, slices)
//! by threading binding rows through each pattern, the same shape as the
//! semi-naive rule joins in the reasoner.

use std::cmp::Ordering;

use oxrdf::{BlankNode, Literal, NamedNode, Subject, Term, Triple, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use spargebra::algebra::{Expression, GraphPattern};
use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};

/// A triple set with a predicate index for BGP joins.
///
/// Patterns almost always carry a constant predicate, so one index covers
/// the common case; everything else falls back to a scan.
#[derive(Debug, Default)]
pub struct TripleIndex {
    triples: Vec<Triple>,
    by_predicate: FxHashMap<NamedNode, Vec<usize>>,
}

impl TripleIndex {
    pub fn new(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut index = Self::default();
        for triple in triples {
            let idx = index.triples.len();
            index
                .by_predicate
                .entry(triple.predicate.clone())
                .or_default()
                .push(idx);
            index.triples.push(triple);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    fn candidates(&self, predicate: Option<&NamedNode>) -> Box<dyn Iterator<Item = &Triple> + '_> {
        match predicate {
            Some(p) => Box::new(
                self.by_predicate
                    .get(p)
                    .into_iter()
                    .flatten()
                    .map(|&i| &self.triples[i]),
            ),
            None => Box::new(self.triples.iter()),
        }
    }
}

/// One solution row: variable name → bound term.
///
/// Blank nodes in WHERE patterns behave as variables; they are keyed as
/// `_:<id>`, which cannot collide with a SPARQL variable name.
pub type Binding = FxHashMap<String, Term>;

fn pattern_key(pattern: &TermPattern) -> Option<String> {
    match pattern {
        TermPattern::Variable(v) => Some(v.as_str().to_owned()),
        TermPattern::BlankNode(b) => Some(format!("_:{}", b.as_str())),
        _ => None,
    }
}

fn pattern_const(pattern: &TermPattern) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(n) => Some(Term::from(n.clone())),
        TermPattern::Literal(l) => Some(Term::from(l.clone())),
        _ => None,
    }
}

fn unify(pattern: &TermPattern, value: &Term, binding: &mut Binding) -> bool {
    if let Some(constant) = pattern_const(pattern) {
        return constant == *value;
    }
    let Some(key) = pattern_key(pattern) else {
        return false;
    };
    match binding.get(&key) {
        Some(bound) => bound == value,
        None => {
            binding.insert(key, value.clone());
            true
        }
    }
}

fn unify_predicate(pattern: &NamedNodePattern, value: &NamedNode, binding: &mut Binding) -> bool {
    match pattern {
        NamedNodePattern::NamedNode(n) => n == value,
        NamedNodePattern::Variable(v) => {
            let term = Term::from(value.clone());
            match binding.get(v.as_str()) {
                Some(bound) => *bound == term,
                None => {
                    binding.insert(v.as_str().to_owned(), term);
                    true
                }
            }
        }
    }
}

fn match_bgp_pattern(pattern: &TriplePattern, index: &TripleIndex, rows: Vec<Binding>) -> Vec<Binding> {
    let mut out = Vec::new();
    for row in rows {
        // resolve the predicate through the current row so the index applies
        // to joined patterns too
        let predicate = match &pattern.predicate {
            NamedNodePattern::NamedNode(n) => Some(n.clone()),
            NamedNodePattern::Variable(v) => match row.get(v.as_str()) {
                Some(Term::NamedNode(n)) => Some(n.clone()),
                Some(_) => continue,
                None => None,
            },
        };
        for triple in index.candidates(predicate.as_ref()) {
            let mut candidate = row.clone();
            if !unify_predicate(&pattern.predicate, &triple.predicate, &mut candidate) {
                continue;
            }
            let subject_term = Term::from(triple.subject.clone());
            if !unify(&pattern.subject, &subject_term, &mut candidate) {
                continue;
            }
            if !unify(&pattern.object, &triple.object, &mut candidate) {
                continue;
            }
            out.push(candidate);
        }
    }
    out
}

/// Evaluate a graph pattern, extending each incoming row.
pub fn eval_pattern(pattern: &GraphPattern, index: &TripleIndex, rows: Vec<Binding>) -> Vec<Binding> {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            let mut rows = rows;
            for tp in patterns {
                rows = match_bgp_pattern(tp, index, rows);
                if rows.is_empty() {
                    break;
                }
            }
            rows
        }
        GraphPattern::Join { left, right } => {
            let rows = eval_pattern(left, index, rows);
            eval_pattern(right, index, rows)
        }
        GraphPattern::Filter { expr, inner } => eval_pattern(inner, index, rows)
            .into_iter()
            .filter(|row| eval_expression(expr, row).and_then(|t| ebv(&t)) == Some(true))
            .collect(),
        GraphPattern::Union { left, right } => {
            let mut out = eval_pattern(left, index, rows.clone());
            out.extend(eval_pattern(right, index, rows));
            out
        }
        GraphPattern::Project { inner, variables } => {
            let keep: FxHashSet<&str> = variables.iter().map(Variable::as_str).collect();
            eval_pattern(inner, index, rows)
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .filter(|(name, _)| keep.contains(name.as_str()))
                        .collect()
                })
                .collect()
        }
        GraphPattern::Distinct { inner } | GraphPattern::Reduced { inner } => {
            dedup_rows(eval_pattern(inner, index, rows))
        }
        GraphPattern::Slice {
            inner,
            start,
            length,
        } => {
            let rows = eval_pattern(inner, index, rows);
            let iter = rows.into_iter().skip(*start);
            match length {
                Some(n) => iter.take(*n).collect(),
                None => iter.collect(),
            }
        }
        GraphPattern::Values {
            variables,
            bindings,
        } => {
            let mut out = Vec::new();
            for row in rows {
                for values in bindings {
                    let mut candidate = row.clone();
                    let mut compatible = true;
                    for (variable, value) in variables.iter().zip(values) {
                        let Some(value) = value else { continue };
                        let Some(term) = ground_to_term(value) else {
                            compatible = false;
                            break;
                        };
                        match candidate.get(variable.as_str()) {
                            Some(bound) if *bound != term => {
                                compatible = false;
                                break;
                            }
                            Some(_) => {}
                            None => {
                                candidate.insert(variable.as_str().to_owned(), term);
                            }
                        }
                    }
                    if compatible {
                        out.push(candidate);
                    }
                }
            }
            out
        }
        // anything else was rejected by the loader
        _ => Vec::new(),
    }
}

fn ground_to_term(term: &GroundTerm) -> Option<Term> {
    match term {
        GroundTerm::NamedNode(n) => Some(Term::from(n.clone())),
        GroundTerm::Literal(l) => Some(Term::from(l.clone())),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn dedup_rows(rows: Vec<Binding>) -> Vec<Binding> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for row in rows {
        let mut entries: Vec<(String, String)> = row
            .iter()
            .map(|(name, term)| (name.clone(), term.to_string()))
            .collect();
        entries.sort();
        if seen.insert(entries) {
            out.push(row);
        }
    }
    out
}

/// Instantiate a CONSTRUCT template against a set of solutions.
///
/// Blank nodes in the template are minted fresh per solution. Instantiations
/// with an unbound variable, a literal subject, or a non-IRI predicate are
/// skipped, matching CONSTRUCT semantics.
pub fn instantiate_template(template: &[TriplePattern], solutions: &[Binding]) -> Vec<Triple> {
    let mut seen: FxHashSet<Triple> = FxHashSet::default();
    let mut out = Vec::new();
    for solution in solutions {
        let mut fresh: FxHashMap<String, BlankNode> = FxHashMap::default();
        for pattern in template {
            let Some(subject) = template_term(&pattern.subject, solution, &mut fresh) else {
                continue;
            };
            let subject: Subject = match subject {
                Term::NamedNode(n) => n.into(),
                Term::BlankNode(b) => b.into(),
                _ => continue,
            };
            let predicate = match &pattern.predicate {
                NamedNodePattern::NamedNode(n) => n.clone(),
                NamedNodePattern::Variable(v) => match solution.get(v.as_str()) {
                    Some(Term::NamedNode(n)) => n.clone(),
                    _ => continue,
                },
            };
            let Some(object) = template_term(&pattern.object, solution, &mut fresh) else {
                continue;
            };
            let triple = Triple::new(subject, predicate, object);
            if seen.insert(triple.clone()) {
                out.push(triple);
            }
        }
    }
    out
}

fn template_term(
    pattern: &TermPattern,
    solution: &Binding,
    fresh: &mut FxHashMap<String, BlankNode>,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(n) => Some(Term::from(n.clone())),
        TermPattern::Literal(l) => Some(Term::from(l.clone())),
        TermPattern::Variable(v) => solution.get(v.as_str()).cloned(),
        TermPattern::BlankNode(b) => Some(Term::from(
            fresh
                .entry(b.as_str().to_owned())
                .or_insert_with(BlankNode::default)
                .clone(),
        )),
        _ => None,
    }
}

/// Evaluate an expression to a term; `None` is the SPARQL error value.
pub fn eval_expression(expr: &Expression, row: &Binding) -> Option<Term> {
    match expr {
        Expression::NamedNode(n) => Some(Term::from(n.clone())),
        Expression::Literal(l) => Some(Term::from(l.clone())),
        Expression::Variable(v) => row.get(v.as_str()).cloned(),
        Expression::Or(a, b) => {
            let a = eval_expression(a, row).and_then(|t| ebv(&t));
            let b = eval_expression(b, row).and_then(|t| ebv(&t));
            match (a, b) {
                (Some(true), _) | (_, Some(true)) => Some(boolean(true)),
                (Some(false), Some(false)) => Some(boolean(false)),
                _ => None,
            }
        }
        Expression::And(a, b) => {
            let a = eval_expression(a, row).and_then(|t| ebv(&t));
            let b = eval_expression(b, row).and_then(|t| ebv(&t));
            match (a, b) {
                (Some(false), _) | (_, Some(false)) => Some(boolean(false)),
                (Some(true), Some(true)) => Some(boolean(true)),
                _ => None,
            }
        }
        Expression::Equal(a, b) => binary(a, b, row, |a, b| {
            Some(boolean(match (numeric(a), numeric(b)) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            }))
        }),
        Expression::SameTerm(a, b) => binary(a, b, row, |a, b| Some(boolean(a == b))),
        Expression::Greater(a, b) => comparison(a, b, row, Ordering::is_gt),
        Expression::GreaterOrEqual(a, b) => comparison(a, b, row, Ordering::is_ge),
        Expression::Less(a, b) => comparison(a, b, row, Ordering::is_lt),
        Expression::LessOrEqual(a, b) => comparison(a, b, row, Ordering::is_le),
        Expression::In(needle, haystack) => {
            let needle = eval_expression(needle, row)?;
            let mut found = false;
            for candidate in haystack {
                if eval_expression(candidate, row)? == needle {
                    found = true;
                    break;
                }
            }
            Some(boolean(found))
        }
        Expression::Add(a, b) => arithmetic(a, b, row, |x, y| x + y),
        Expression::Subtract(a, b) => arithmetic(a, b, row, |x, y| x - y),
        Expression::Multiply(a, b) => arithmetic(a, b, row, |x, y| x * y),
        Expression::Divide(a, b) => binary(a, b, row, |a, b| {
            let (x, y) = (numeric(a)?, numeric(b)?);
            Some(double(x / y))
        }),
        Expression::UnaryPlus(a) => {
            let a = eval_expression(a, row)?;
            numeric(&a).map(double)
        }
        Expression::UnaryMinus(a) => {
            let a = eval_expression(a, row)?;
            numeric(&a).map(|v| double(-v))
        }
        Expression::Not(a) => eval_expression(a, row)
            .and_then(|t| ebv(&t))
            .map(|b| boolean(!b)),
        Expression::Bound(v) => Some(boolean(row.contains_key(v.as_str()))),
        Expression::If(cond, then, otherwise) => {
            match eval_expression(cond, row).and_then(|t| ebv(&t))? {
                true => eval_expression(then, row),
                false => eval_expression(otherwise, row),
            }
        }
        Expression::Coalesce(candidates) => candidates
            .iter()
            .find_map(|candidate| eval_expression(candidate, row)),
        // rejected at load time
        _ => None,
    }
}

fn binary(
    a: &Expression,
    b: &Expression,
    row: &Binding,
    op: impl Fn(&Term, &Term) -> Option<Term>,
) -> Option<Term> {
    let a = eval_expression(a, row)?;
    let b = eval_expression(b, row)?;
    op(&a, &b)
}

fn comparison(
    a: &Expression,
    b: &Expression,
    row: &Binding,
    test: impl Fn(Ordering) -> bool,
) -> Option<Term> {
    binary(a, b, row, |a, b| compare(a, b).map(|o| boolean(test(o))))
}

fn arithmetic(
    a: &Expression,
    b: &Expression,
    row: &Binding,
    op: impl Fn(f64, f64) -> f64,
) -> Option<Term> {
    binary(a, b, row, |a, b| {
        let result = op(numeric(a)?, numeric(b)?);
        if result.fract() == 0.0 && is_integer_literal(a) && is_integer_literal(b) {
            Some(integer(result as i64))
        } else {
            Some(double(result))
        }
    })
}

const XSD_NUMERIC: &[&str] = &[
    "http://www.w3.org/2001/XMLSchema#integer",
    "http://www.w3.org/2001/XMLSchema#decimal",
    "http://www.w3.org/2001/XMLSchema#double",
    "http://www.w3.org/2001/XMLSchema#float",
    "http://www.w3.org/2001/XMLSchema#long",
    "http://www.w3.org/2001/XMLSchema#int",
    "http://www.w3.org/2001/XMLSchema#short",
    "http://www.w3.org/2001/XMLSchema#byte",
    "http://www.w3.org/2001/XMLSchema#nonNegativeInteger",
    "http://www.w3.org/2001/XMLSchema#positiveInteger",
    "http://www.w3.org/2001/XMLSchema#nonPositiveInteger",
    "http://www.w3.org/2001/XMLSchema#negativeInteger",
    "http://www.w3.org/2001/XMLSchema#unsignedLong",
    "http://www.w3.org/2001/XMLSchema#unsignedInt",
    "http://www.w3.org/2001/XMLSchema#unsignedShort",
    "http://www.w3.org/2001/XMLSchema#unsignedByte",
];

fn numeric(term: &Term) -> Option<f64> {
    let Term::Literal(literal) = term else {
        return None;
    };
    if !XSD_NUMERIC.contains(&literal.datatype().as_str()) {
        return None;
    }
    literal.value().parse().ok()
}

fn is_integer_literal(term: &Term) -> bool {
    matches!(term, Term::Literal(l)
        if l.datatype().as_str() != "http://www.w3.org/2001/XMLSchema#double"
            && l.datatype().as_str() != "http://www.w3.org/2001/XMLSchema#float"
            && l.datatype().as_str() != "http://www.w3.org/2001/XMLSchema#decimal")
}

fn compare(a: &Term, b: &Term) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Term::Literal(x), Term::Literal(y)) if x.datatype() == y.datatype() => {
            Some(x.value().cmp(y.value()))
        }
        _ => None,
    }
}

/// SPARQL effective boolean value.
fn ebv(term: &Term) -> Option<bool> {
    let Term::Literal(literal) = term else {
        return None;
    };
    match literal.datatype().as_str() {
        "http://www.w3.org/2001/XMLSchema#boolean" => match literal.value() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        "http://www.w3.org/2001/XMLSchema#string" => Some(!literal.value().is_empty()),
        _ => numeric(term).map(|v| v != 0.0 && !v.is_nan()),
    }
}

fn boolean(value: bool) -> Term {
    Term::from(Literal::new_typed_literal(
        if value { "true" } else { "false" },
        oxrdf::vocab::xsd::BOOLEAN,
    ))
}

fn integer(value: i64) -> Term {
    Term::from(Literal::new_typed_literal(
        value.to_string(),
        oxrdf::vocab::xsd::INTEGER,
    ))
}

fn double(value: f64) -> Term {
    Term::from(Literal::new_typed_literal(
        value.to_string(),
        oxrdf::vocab::xsd::DOUBLE,
    ))
}
