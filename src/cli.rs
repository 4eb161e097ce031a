use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Build dashboard datasets from tabular files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer column roles (time, metric, dimension) from a file's first row
    Probe(ProbeArgs),
    /// Clean, derive, filter, and optionally summarize a dataset
    Process(ProcessArgs),
    /// Produce summary statistics for metric columns
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input file to inspect (.csv, .tsv, or .json rows)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Optional destination for the inferred column map (JSON)
    #[arg(short, long)]
    pub map: Option<PathBuf>,
    /// Delimiter character for delimited input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input file to process (.csv, .tsv, or .json rows)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination CSV path; omit to write to stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Derived-column formula line `Target = [Col] * 2` (repeatable)
    #[arg(long = "formula", action = clap::ArgAction::Append)]
    pub formula: Vec<String>,
    /// File containing one formula per line
    #[arg(long = "formulas-file")]
    pub formulas_file: Option<PathBuf>,
    /// Column to treat as the x-axis for the time-range filter
    #[arg(long = "x-axis")]
    pub x_axis: Option<String>,
    /// Inclusive lower bound of the time range (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// Inclusive upper bound of the time range (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
    /// Dimension allow-set such as `region=North|South` (repeatable)
    #[arg(long = "allow", action = clap::ArgAction::Append)]
    pub allow: Vec<String>,
    /// Group-and-sum summary mode instead of row-level output
    #[arg(long)]
    pub summary: bool,
    /// Dimension column to group by in summary mode
    #[arg(long)]
    pub group: Option<String>,
    /// Metric columns to aggregate (comma separated, repeatable)
    #[arg(short = 'M', long = "metrics", action = clap::ArgAction::Append)]
    pub metrics: Vec<String>,
    /// Delimiter character for delimited input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Print an aligned table instead of CSV (stdout only)
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Input file to profile (.csv, .tsv, or .json rows)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Metric columns to include (defaults to every inferred metric)
    #[arg(short = 'M', long = "metrics", action = clap::ArgAction::Append)]
    pub metrics: Vec<String>,
    /// Derived-column formula line applied before profiling (repeatable)
    #[arg(long = "formula", action = clap::ArgAction::Append)]
    pub formula: Vec<String>,
    /// Delimiter character for delimited input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
