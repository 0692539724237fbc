//! `pythinfer query`: evaluate a SPARQL query against `combined_wanted`.

use std::collections::HashSet;
use std::path::Path;

use oxrdf::{Quad, Triple};
use pythinfer_pipeline::{wanted_quads, CancelToken, ProceduralRegistry};
use pythinfer_sparql::{QueryOutcome, SparqlQuery, TripleIndex};

use crate::commands::{resolve_project, text_or_file};
use crate::error::CliResult;

pub fn run(config: Option<&Path>, no_create: bool, query_arg: &str) -> CliResult<()> {
    let text = text_or_file(query_arg)?;
    let query = SparqlQuery::parse("query", &text)?;

    let project = resolve_project(config, no_create)?;
    let registry = ProceduralRegistry::new();
    let (wanted, _report) = wanted_quads(&project, &registry, &CancelToken::new())?;

    let index = TripleIndex::new(dedup_triples(wanted));
    match query.evaluate(&index)? {
        QueryOutcome::Boolean(answer) => println!("{answer}"),
        QueryOutcome::Graph(triples) => {
            for triple in triples {
                println!("{triple} .");
            }
        }
        QueryOutcome::Solutions { variables, rows } => {
            println!("{}", variables.join("\t"));
            for row in rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|term| term.as_ref().map_or(String::new(), |t| t.to_string()))
                    .collect();
                println!("{}", cells.join("\t"));
            }
        }
    }
    Ok(())
}

/// Distinct triples of a quad set; queries see the union, not provenance.
fn dedup_triples(quads: Vec<Quad>) -> Vec<Triple> {
    let mut seen = HashSet::new();
    quads
        .into_iter()
        .map(|q| Triple::new(q.subject, q.predicate, q.object))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
