//! Command-line client for the `nestql` query language.
//!
//! Translates a query expression into a Query-DSL document and either dumps
//! the request or posts it to an OpenSearch `_search` endpoint.

mod args;
mod client;

use std::process::ExitCode;

use clap::Parser;
use serde_json::{Value, json};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use args::Args;
use client::{ClientError, SearchClient};

/// Errors surfaced to the user as `Error: <message>`.
#[derive(Debug, Error)]
enum CliError {
    /// The query string failed to compile.
    #[error(transparent)]
    Query(#[from] nestql_query::InvalidQuery),

    /// The search request failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The request body could not be serialised.
    #[error("failed to serialise request body: {0}")]
    Serialise(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Translates the query and either dumps or executes the request.
fn run(args: &Args) -> Result<(), CliError> {
    let query = nestql_query::parse(&args.query)?;
    let body = json!({ "query": query });

    if args.dump {
        print_dump(&args.index, args.includes.as_deref(), &body)?;
        return Ok(());
    }

    let client = SearchClient::new(&args.host, args.port);
    let response = client.search(&args.index, &body, args.includes.as_deref())?;
    println!("{response}");
    Ok(())
}

/// Prints the request line and pretty-printed body without executing it.
fn print_dump(index: &str, includes: Option<&str>, body: &Value) -> Result<(), CliError> {
    let suffix = match includes {
        Some(csv) if !csv.is_empty() => format!("?_source_includes={csv}"),
        _ => String::new(),
    };
    println!("GET {index}/_search{suffix}");
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

/// Routes log output to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}
