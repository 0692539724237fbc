use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pythinfer", about = "RDF merging and inference pipeline", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to the project config file (skips discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never create a project config automatically
    #[arg(long, global = true)]
    pub no_create: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover RDF files in the current directory and write a project config
    Create {
        /// Directory to scan (defaults to the current directory)
        folder: Option<PathBuf>,
    },

    /// Merge the project inputs and export the `merged` artifact
    Merge,

    /// Run the full inference pipeline and export all artifacts
    Infer,

    /// Run a SPARQL query (SELECT, CONSTRUCT or ASK) against the inferred,
    /// filtered dataset; reuses cached inference results when fresh
    Query {
        /// The query text, or a path to a file containing it
        query: String,
    },
}
