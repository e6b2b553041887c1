pub mod cell;
pub mod cli;
pub mod data;
pub mod error;
pub mod guess;
pub mod io_utils;
pub mod preview;
pub mod probe;
pub mod processor;
pub mod replay;
pub mod rowset;
pub mod table;
pub mod tableset;
pub mod types;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result as AnyResult, anyhow};
use clap::Parser;
use log::{LevelFilter, debug};

pub use crate::{
    cell::{Cell, Row},
    data::Value,
    error::{Result, RowSetError},
    guess::{GuessPolicy, HeaderGuess},
    processor::{CastPolicy, Processor, RowContext},
    replay::ReplayBuffer,
    rowset::RowSet,
    tableset::{CsvOptions, CsvTableSet, TableSet},
    types::CellType,
};

use crate::{
    cli::{Cli, Commands, InputArgs},
    tableset::CsvSource,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("rowstream", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> AnyResult<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => preview::execute(&args),
        Commands::Probe(args) => probe::execute(&args),
    }
}

/// Opens the input described by `args` and resolves its headers and column
/// types from a single bounded sample. Nothing beyond the sample is read.
pub(crate) fn open_prepared_table(args: &InputArgs) -> AnyResult<RowSet<CsvSource>> {
    let options = CsvOptions {
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
        window: args.sample_rows,
    };
    let mut table = CsvTableSet::from_path(&args.input, &options)
        .with_context(|| format!("Opening {:?}", args.input))?
        .into_table()
        .ok_or_else(|| anyhow!("No table found in {:?}", args.input))?;

    if args.no_header {
        table.autogenerate_headers()?;
    } else {
        table
            .guess_headers(args.header_tolerance)
            .with_context(|| format!("Detecting headers in {:?}", args.input))?;
    }

    if args.types.is_empty() {
        let policy = GuessPolicy::default()
            .with_window(args.sample_rows)
            .with_threshold(args.threshold)?;
        table
            .guess_types(&policy)
            .with_context(|| format!("Guessing column types in {:?}", args.input))?;
    } else {
        table.set_types(args.types.clone());
    }
    debug!(
        "Prepared {:?}: headers {:?}, types {:?}",
        table,
        table.column_headers(),
        table.types()
    );
    Ok(table)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
