use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    guess::{DEFAULT_HEADER_TOLERANCE, DEFAULT_SAMPLE_WINDOW},
    types::CellType,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Preview and profile messy tabular data in a single pass",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the first rows of a file with detected headers and types
    Preview(PreviewArgs),
    /// Detect headers and column types and report them as JSON
    Probe(ProbeArgs),
}

/// Options shared by every command that reads a table.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input file to read ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Field delimiter (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows sampled for header and type detection
    #[arg(long, default_value_t = DEFAULT_SAMPLE_WINDOW)]
    pub sample_rows: usize,
    /// Fraction of sampled non-empty values that must fit a type (0.0 to 1.0)
    #[arg(long, default_value_t = 1.0)]
    pub threshold: f64,
    /// How many leading rows may be searched for the header row
    #[arg(long, default_value_t = DEFAULT_HEADER_TOLERANCE)]
    pub header_tolerance: usize,
    /// Treat the first row as data and generate column names
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// Explicit column types, comma separated, instead of guessing
    #[arg(long, value_delimiter = ',', value_parser = parse_cell_type)]
    pub types: Vec<CellType>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Replace values that fail to cast with empty cells instead of stopping
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Destination JSON file (stdout when omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
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

fn parse_cell_type(value: &str) -> Result<CellType, String> {
    value.parse::<CellType>().map_err(|err| err.to_string())
}
