//! mlmd-filter - compile metadata filter expressions from the command line
//!
//! ```text
//! mlmd-filter compile --kind artifact "type = 'Model' AND contexts_0.name = 'run'"
//! mlmd-filter check --kind context "parent_contexts_a.id = 1"
//! mlmd-filter parse "NOT (a = 1 OR b = 2)"
//! ```

mod config;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use mlmd_filter_query::{Compiler, EntityKind, FilterQuery};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "mlmd-filter")]
#[command(version, about = "Compile metadata filter expressions into SQL fragments")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the FROM and WHERE fragments of an expression
    Compile {
        /// Entity kind to filter: artifact, execution or context
        #[arg(short, long)]
        kind: EntityKind,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also print a complete `SELECT table_0.id ...` statement
        #[arg(long)]
        full_sql: bool,

        expression: String,
    },

    /// Validate an expression; reports through the exit status
    Check {
        #[arg(short, long)]
        kind: EntityKind,

        expression: String,
    },

    /// Parse an expression and print it in canonical form
    Parse { expression: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct CompileOutput<'a> {
    #[serde(flatten)]
    query: &'a FilterQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<String>,
}

fn main() -> ExitCode {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;
    tracing::debug!(options = ?config.compile, "configuration loaded");

    let compiler = Compiler::new(config.compile);

    match cli.command {
        Command::Compile {
            kind,
            format,
            full_sql,
            expression,
        } => {
            let query = compiler
                .compile(&expression, kind)
                .with_context(|| format!("Failed to compile filter for {kind}"))?;
            print_query(&query, format, full_sql)
        }
        Command::Check { kind, expression } => {
            compiler
                .compile(&expression, kind)
                .with_context(|| format!("Invalid filter for {kind}"))?;
            Ok(())
        }
        Command::Parse { expression } => {
            let ast = compiler
                .parse(&expression)
                .context("Failed to parse filter")?;
            println!("{ast}");
            Ok(())
        }
    }
}

fn print_query(query: &FilterQuery, format: OutputFormat, full_sql: bool) -> anyhow::Result<()> {
    let sql = full_sql.then(|| query.to_select_ids_sql());
    match format {
        OutputFormat::Text => {
            println!("FROM {}", query.full_from_clause().trim_end());
            println!("WHERE {}", query.where_clause);
            if let Some(sql) = sql {
                println!();
                println!("{sql}");
            }
        }
        OutputFormat::Json => {
            let output = CompileOutput { query, sql };
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compile_args() {
        let cli = Cli::try_parse_from([
            "mlmd-filter",
            "compile",
            "--kind",
            "execution",
            "--format",
            "json",
            "--full-sql",
            "id = 1",
        ])
        .unwrap();
        match cli.command {
            Command::Compile {
                kind,
                format,
                full_sql,
                expression,
            } => {
                assert_eq!(kind, EntityKind::Execution);
                assert_eq!(format, OutputFormat::Json);
                assert!(full_sql);
                assert_eq!(expression, "id = 1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["mlmd-filter", "check", "--kind", "node", "id = 1"]).is_err());
    }

    #[test]
    fn test_json_output_includes_sql() {
        let query = mlmd_filter_query::compile("name = 'a'", EntityKind::Context).unwrap();
        let output = CompileOutput {
            query: &query,
            sql: Some(query.to_select_ids_sql()),
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["entity_kind"], "context");
        assert_eq!(value["where_clause"], "(table_0.name) = (\"a\")");
        assert!(value["sql"].as_str().unwrap().starts_with("SELECT table_0.id FROM `Context`"));
    }
}
