//! paleoart-resolver — Binary Entrypoint
//! Reads a taxon table, resolves one illustration per row, prints JSON lines.
//!
//! Usage: `paleoart-resolver <table.csv>`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paleoart_resolver::range::periods_for;
use paleoart_resolver::{color_for, commons_resolver, load_table, parse_range, ResolverConfig};

/// Resolve one illustration per taxon row and print JSON lines.
#[derive(Debug, Parser)]
#[command(name = "paleoart-resolver", version, about)]
struct Args {
    /// Comma-delimited table with a header row (see `required_fields`).
    table: PathBuf,
}

/// Compact tracing to stderr; `RUST_LOG` overrides the default filter.
/// `RESOLVER_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paleoart_resolver=info,warn"));

    let json = std::env::var("RESOLVER_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(path: PathBuf) -> Result<()> {
    let cfg = ResolverConfig::load_default().context("loading resolver config")?;
    let table = load_table(&path, &cfg.required_fields)?;
    tracing::info!(rows = table.rows.len(), path = %path.display(), "table loaded");

    let resolver = commons_resolver(&cfg)?;
    let resolutions = resolver.resolve_all(table.rows.clone()).await;

    let range_field = cfg.required_fields.get(1).map(String::as_str);
    for (row, res) in table.rows.iter().zip(resolutions) {
        let range = range_field.and_then(|f| row.get(f)).and_then(parse_range);
        let line = json!({
            "id": row.id(),
            "range": range,
            "periods": range.as_ref().map(periods_for).unwrap_or_default(),
            "color": color_for(row.id()),
            "image": res.url,
            "stage": res.stage,
        });
        println!("{line}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(args.table).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "resolution failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn table_path_is_positional() {
        let args = Args::try_parse_from(["paleoart-resolver", "taxa.csv"]).unwrap();
        assert_eq!(args.table, PathBuf::from("taxa.csv"));
    }

    #[test]
    fn help_flag_is_not_a_table_path() {
        let err = Args::try_parse_from(["paleoart-resolver", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);

        let err = Args::try_parse_from(["paleoart-resolver"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
