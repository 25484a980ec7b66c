mod config;
mod where_clause;

use clap::{Parser, Subcommand};
use config::Config;
use query_engine::{QueryError, Table};
use std::fs::File;
use std::path::PathBuf;
use storage_engine::{EngineError, OpenMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Bulk-load and query tool for minidb tables", long_about = None)]
struct Cli {
    /// Path to a minidb.toml config file
    #[arg(long, default_value = "minidb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bulk-load `<table>.tbl` from a `key, value` text file.
    Load {
        table: String,
        file: PathBuf,
        /// Build a B+Tree index on the key column after loading.
        #[arg(long)]
        index: bool,
    },
    /// Run a selection query: `key`/`value` predicates ANDed together.
    Select {
        table: String,
        /// A `key<op><literal>` or `value<op><literal>` clause; repeatable.
        #[arg(long = "where")]
        where_clauses: Vec<String>,
        /// What to project for each surviving row.
        #[arg(long = "select", value_enum, default_value = "star")]
        projection: Projection,
        /// Print only the matching count, not the rows. Equivalent to
        /// `--select count`.
        #[arg(long)]
        count: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Projection {
    Key,
    Value,
    Star,
    Count,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to read {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter.clone())),
        )
        .init();

    let result = match cli.command {
        Command::Load { table, file, index } => run_load(&config, &table, &file, index),
        Command::Select {
            table,
            where_clauses,
            projection,
            count,
        } => {
            let projection = if count { Projection::Count } else { projection };
            run_select(&config, &table, &where_clauses, projection)
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

/// Renders a missing table file the way the shell has always reported it:
/// `Error: table <name> does not exist`, rather than the generic I/O
/// message (which names the underlying `.tbl`/`.idx` path instead of the
/// table).
fn table_open_error(table: &str, err: QueryError) -> String {
    match err {
        QueryError::Storage(EngineError::TableNotFound(_)) => {
            format!("Error: table {table} does not exist")
        }
        other => other.to_string(),
    }
}

fn run_load(config: &Config, table: &str, file: &PathBuf, build_index: bool) -> Result<(), String> {
    let mut t = Table::open(&config.data_dir, table, OpenMode::Write).map_err(|e| e.to_string())?;
    let source = File::open(file).map_err(|e| format!("opening {}: {e}", file.display()))?;

    if build_index {
        t.open_index(&config.data_dir, table)
            .map_err(|e| e.to_string())?;
    }

    let loaded = t.bulk_load(source).map_err(|e| e.to_string())?;
    println!("loaded {loaded} records into {table}");
    if build_index {
        println!("built index on {table}.idx");
    }

    t.close().map_err(|e| e.to_string())
}

fn run_select(
    config: &Config,
    table: &str,
    where_clauses: &[String],
    projection: Projection,
) -> Result<(), String> {
    let predicates = where_clauses
        .iter()
        .map(|c| where_clause::parse(c))
        .collect::<Result<Vec<_>, _>>()?;

    let t = Table::open(&config.data_dir, table, OpenMode::Read)
        .map_err(|e| table_open_error(table, e))?;

    match projection {
        Projection::Count => {
            let n = t.count(&predicates).map_err(|e| e.to_string())?;
            println!("{n}");
        }
        Projection::Key => {
            for record in t.select(&predicates).map_err(|e| e.to_string())? {
                println!("{}", record.key);
            }
        }
        Projection::Value => {
            for record in t.select(&predicates).map_err(|e| e.to_string())? {
                println!("{}", record.value);
            }
        }
        Projection::Star => {
            for record in t.select(&predicates).map_err(|e| e.to_string())? {
                println!("{}\t{}", record.key, record.value);
            }
        }
    }
    Ok(())
}
