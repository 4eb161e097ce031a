use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use clap::Parser;
use log::LevelFilter;

pub mod clean;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod expr;
pub mod formula;
pub mod infer;
pub mod insight;
pub mod io_utils;
pub mod pipeline;
pub mod stats;
pub mod table;

static LOGGER: OnceLock<()> = OnceLock::new();

/// Initializes env_logger once per process. Honors RUST_LOG when set,
/// otherwise logs this crate at info level.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_default_env();
        if std::env::var("RUST_LOG").is_err() {
            builder.filter_module(env!("CARGO_PKG_NAME"), LevelFilter::Info);
        }
        builder.format_timestamp_millis().init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::Probe(args) => handle_probe(&args),
        cli::Commands::Process(args) => pipeline::execute(&args),
        cli::Commands::Stats(args) => stats::execute(&args),
    }
}

/// `probe` subcommand: classify columns from the first data row and report
/// the inferred roles, optionally persisting the map as JSON.
fn handle_probe(args: &cli::ProbeArgs) -> Result<()> {
    let dataset = io_utils::read_dataset(&args.input, args.delimiter)?;
    let sample = dataset
        .sample_row()
        .ok_or_else(|| anyhow!("{:?} contains no data rows", args.input))?;
    let mapping = infer::ColumnMap::classify(&dataset.columns, sample);

    let headers = vec!["column".to_string(), "role".to_string()];
    let rows: Vec<Vec<String>> = mapping
        .columns
        .iter()
        .map(|binding| vec![binding.name.clone(), binding.role.label().to_string()])
        .collect();
    table::print_table(&headers, &rows);

    if let Some(path) = &args.map {
        mapping.save(path)?;
        log::info!("Wrote column map for {} column(s) to {path:?}", mapping.len());
    }
    Ok(())
}
