//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::StockpileError;
use crate::domain::pipeline::{self, CancelToken, DEFAULT_BATCH_SIZE};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "stockpile", about = "Daily stock data importer and indicator pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a delimited stock data file and derive indicators
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
        /// Keep rows from previous runs instead of clearing the table first
        #[arg(long)]
        keep_existing: bool,
        /// Skip the DSA and moving-average derivation pass
        #[arg(long)]
        skip_derive: bool,
    },
    /// Recompute derived fields over already-stored rows
    Derive {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show record counts, DSA distribution and recent rows for one stock
    Stats {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 2330)]
        id: i32,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Import {
            config,
            file,
            keep_existing,
            skip_derive,
        } => run_with_store(&config, |store, cfg| {
            run_import_pipeline(store, cfg, &file, keep_existing, skip_derive, &CancelToken::new())
        }),
        Command::Derive { config } => run_with_store(&config, |store, cfg| {
            run_derive_pipeline(store, cfg, &CancelToken::new())
        }),
        Command::Stats { config, id, limit } => {
            run_with_store(&config, |store, _| run_stats_report(store, id, limit))
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StockpileError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Resolve the configured store backend.
///
/// `[store] backend` defaults to `sqlite`; a backend that was not compiled
/// in falls through to the unsupported arm.
pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn StorePort>, StockpileError> {
    let backend = config
        .get_string("store", "backend")
        .unwrap_or_else(|| "sqlite".to_string());

    match backend.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
        )),
        #[cfg(feature = "postgres")]
        "postgres" => Ok(Box::new(
            crate::adapters::postgres_adapter::PostgresAdapter::from_config(config)?,
        )),
        other => Err(StockpileError::ConfigInvalid {
            section: "store".into(),
            key: "backend".into(),
            reason: format!("unsupported backend {other:?}"),
        }),
    }
}

fn run_with_store<F>(config_path: &Path, body: F) -> ExitCode
where
    F: FnOnce(&dyn StorePort, &dyn ConfigPort) -> Result<(), StockpileError>,
{
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match body(store.as_ref(), &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn batch_size_from(config: &dyn ConfigPort) -> usize {
    config
        .get_int("import", "batch_size", DEFAULT_BATCH_SIZE as i64)
        .clamp(1, 10_000) as usize
}

/// The fixed import sequence: schema → clear → parse → upsert → derive →
/// summary. Parse failures are logged and counted, never fatal.
pub fn run_import_pipeline(
    store: &dyn StorePort,
    config: &dyn ConfigPort,
    file: &Path,
    keep_existing: bool,
    skip_derive: bool,
    cancel: &CancelToken,
) -> Result<(), StockpileError> {
    store.ensure_schema()?;

    if !keep_existing {
        let removed = store.clear_all()?;
        eprintln!("Cleared {removed} existing rows");
    }

    eprintln!("Reading {}", file.display());
    let input = File::open(file)?;
    let report = pipeline::collect_records(BufReader::new(input))?;

    for reject in &report.rejected {
        eprintln!(
            "line {}: skipped ({}): {}",
            reject.line_number, reject.error, reject.raw
        );
    }
    eprintln!(
        "Parsed {} data lines: {} ok, {} skipped",
        report.data_lines,
        report.records.len(),
        report.rejected.len()
    );

    let batch_size = batch_size_from(config);
    let written = pipeline::import_records(store, &report.records, batch_size, cancel)?;
    eprintln!("Imported {written} records");

    if !skip_derive {
        let stats = pipeline::derive_indicators(store, batch_size, cancel)?;
        eprintln!(
            "Derived DSA and 5-day averages for {} rows across {} stocks",
            stats.rows, stats.stocks
        );
    }

    let total = store.count()?;
    eprintln!(
        "\nImport complete: {total} rows in store ({} parsed ok, {} skipped)",
        report.records.len(),
        report.rejected.len()
    );
    Ok(())
}

/// Standalone recompute pass over whatever the store already holds.
pub fn run_derive_pipeline(
    store: &dyn StorePort,
    config: &dyn ConfigPort,
    cancel: &CancelToken,
) -> Result<(), StockpileError> {
    store.ensure_schema()?;

    let stats = pipeline::derive_indicators(store, batch_size_from(config), cancel)?;
    eprintln!(
        "Derived DSA and 5-day averages for {} rows across {} stocks",
        stats.rows, stats.stocks
    );
    Ok(())
}

/// Summary report: totals, DSA distribution, most recent rows for one id.
pub fn run_stats_report(
    store: &dyn StorePort,
    id: i32,
    limit: usize,
) -> Result<(), StockpileError> {
    let total = store.count()?;
    let stats = store.dsa_stats()?;

    println!("=== DSA statistics ===");
    println!("  total rows: {total}");
    println!("  positive:   {}", stats.positive);
    println!("  negative:   {}", stats.negative);
    println!("  zero:       {}", stats.zero);
    match (&stats.min, &stats.max) {
        (Some(min), Some(max)) => {
            println!("  min:        {min}");
            println!("  max:        {max}");
        }
        _ => println!("  no derived values yet (run `stockpile derive`)"),
    }

    let rows = store.latest_for(id, limit)?;
    if rows.is_empty() {
        eprintln!("\nNo rows found for id {id}");
        return Ok(());
    }

    println!("\nLatest rows for {id} ({}):", rows[0].name);
    println!("date       | close      | DSA       | MA5");
    println!("-----------|------------|-----------|--------");
    for row in &rows {
        println!(
            "{} | {:>10} | {:>9} | {:>7}",
            row.trade_date,
            row.close,
            row.dsa_indicator
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
            row.ma_5_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}
