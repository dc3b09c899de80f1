//! Tabsync - keep a stored table in line with a JSON dataset.
//!
//! Tables live in a directory of snapshot files. `push` reconciles a table
//! with a JSON array of records, `pull` prints the stored table and `diff`
//! compares two record files without touching any table. Results go to
//! stdout as JSON; logs go to stderr.

mod config;
mod error;
mod file_store;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabsync_engine::{
    ColumnDef, ColumnType, DataTable, Differ, PagedDiffer, Record, Table, TableBinding,
    TableSchema,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::file_store::FileStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding table snapshots (overrides TABSYNC_STORE_DIR)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two JSON record files
    Diff {
        /// Records before the change
        #[arg(long)]
        old: PathBuf,

        /// Records after the change
        #[arg(long)]
        new: PathBuf,

        /// Key column (repeat for composite keys)
        #[arg(short, long = "key", required = true)]
        keys: Vec<String>,

        /// Diff one page at a time (overrides TABSYNC_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Print a stored table as a snapshot
    Pull {
        /// Table name
        table: String,

        /// Write the snapshot to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reconcile a stored table with a JSON record file
    Push {
        /// Table name
        table: String,

        /// JSON array of records
        #[arg(long)]
        data: PathBuf,

        /// Primary key column (repeat for composite keys); required for a new table
        #[arg(short, long = "key")]
        keys: Vec<String>,

        /// Rename the table
        #[arg(long)]
        rename: Option<String>,
    },
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabsync=info,tabsync_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let page_size = match &cli.command {
        Commands::Diff { page_size, .. } => *page_size,
        _ => None,
    };
    let config = Config::from_env()?.with_overrides(cli.store_dir, page_size)?;

    run(cli.command, &config)?;
    Ok(())
}

fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Diff { old, new, keys, .. } => {
            let old = read_records(&old)?;
            let new = read_records(&new)?;
            let outcome = match config.page_size {
                Some(page_size) => PagedDiffer::new(keys, page_size)?.diff(&old, &new)?,
                None => Differ::new(keys).diff(&old, &new)?,
            };
            outcome.log_warnings();
            tracing::info!(
                insert = outcome.changes.insert.len(),
                update = outcome.changes.update.len(),
                delete = outcome.changes.delete.len(),
                "diff complete"
            );
            print_json(&outcome)
        }
        Commands::Pull { table, output } => {
            let store = FileStore::open(&config.store_dir)?;
            let snapshot = store.load(&table)?;
            match output {
                Some(path) => {
                    fs::write(&path, snapshot.to_json_pretty()?)
                        .map_err(|source| AppError::Write {
                            path: path.clone(),
                            source,
                        })?;
                    tracing::info!(table = %table, path = %path.display(), "wrote snapshot");
                    Ok(())
                }
                None => print_json(&snapshot),
            }
        }
        Commands::Push {
            table,
            data,
            keys,
            rename,
        } => {
            let data = DataTable::from_records(read_records(&data)?);
            let mut store = FileStore::open(&config.store_dir)?;

            if !store.contains(&table)? {
                if keys.is_empty() {
                    return Err(tabsync_engine::Error::MissingPrimaryKey(table).into());
                }
                if let Some(column) = keys.iter().find(|k| !data.columns().contains(k)) {
                    return Err(tabsync_engine::Error::MissingKeyColumn {
                        column: column.clone(),
                    }
                    .into());
                }
                let schema = inferred_schema(&data, &keys);
                tracing::info!(table = %table, columns = schema.columns.len(), "creating table");
                store.create_table(&table, schema)?;
            }

            let mut binding = TableBinding::open(store, &table)?;
            if !keys.is_empty() {
                binding.set_primary_keys(keys);
            }
            if let Some(name) = rename {
                binding.rename(name);
            }

            let report = binding.push(&data)?;
            tracing::info!(
                table = %binding.name(),
                inserted = report.inserted,
                deleted = report.deleted,
                updated = report.updated,
                "push complete"
            );
            print_json(&report)
        }
    }
}

/// Column definitions inferred from the data, in column order.
fn inferred_schema(data: &DataTable, keys: &[String]) -> TableSchema {
    let columns = data
        .columns()
        .iter()
        .map(|name| {
            let values = data.column_values(name).unwrap_or_default();
            ColumnDef::new(name.clone(), ColumnType::infer(&values))
        })
        .collect();
    TableSchema::new(columns, keys.to_vec())
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let json = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
