//! Clap argument definitions for the `nestql` CLI.

use clap::Parser;

/// Top-level CLI options.
#[derive(Parser, Debug)]
#[command(name = "nestql")]
#[command(about = "Translate nestql queries and search an OpenSearch index")]
#[command(after_help = "\
QUERY SYNTAX:
  keyword            Bare term, lowered to a query_string clause
  field:value        Field-scoped match
  a AND b, a OR b    Boolean composition; NOT a negates
  field:(a OR b)     Distribute a field over a group
  path>(expr)        Nested-document query; inner fields gain the path prefix
  f:[a TO b]         Inclusive range; f:{a TO b} is exclusive
  _exists_:field     Existence check
  @key=value         Leading directive tuning bare-keyword lowering

EXAMPLES:
  nestql works 'title:Inferno' --dump
  nestql works 'authors>(authors.surname:Strindberg ~ NOT authors.type:editor)'
  nestql works 'date:[2022-01-13 TO now]' -i title,date")]
pub struct Args {
    /// Index to search
    pub index: String,

    /// Search query
    pub query: String,

    /// Comma-separated source fields to include in hits
    #[arg(short = 'i', long = "includes")]
    pub includes: Option<String>,

    /// Print the translated request instead of executing it
    #[arg(short = 'd', long = "dump")]
    pub dump: bool,

    /// Search endpoint host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Search endpoint port
    #[arg(long, default_value_t = 9200)]
    pub port: u16,
}
