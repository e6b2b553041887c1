use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{cli::ProbeArgs, types::CellType};

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub table: String,
    /// Raw row index of the detected header, absent when names were generated.
    pub header_row: Option<usize>,
    pub rows_sampled: usize,
    pub columns: Vec<ProbeColumn>,
}

#[derive(Debug, Serialize)]
pub struct ProbeColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
    pub autogenerated: bool,
}

pub fn execute(args: &ProbeArgs) -> Result<()> {
    let rowset = crate::open_prepared_table(&args.input)?;
    let headers = rowset.column_headers().unwrap_or_default();
    let types = rowset.types().unwrap_or_default();
    let header_row = rowset.header_offset().checked_sub(1);
    let width = headers.len().max(types.len());

    let columns = (0..width)
        .map(|idx| {
            let header = headers.get(idx).map(|h| h.trim()).filter(|h| !h.is_empty());
            ProbeColumn {
                name: header
                    .map(str::to_string)
                    .unwrap_or_else(|| crate::processor::generate_field_name(idx)),
                cell_type: types.get(idx).copied().unwrap_or(CellType::String),
                autogenerated: header_row.is_none() || header.is_none(),
            }
        })
        .collect::<Vec<_>>();

    let report = ProbeReport {
        table: rowset.name().to_string(),
        header_row,
        rows_sampled: rowset.rows_read(),
        columns,
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    serde_json::to_writer_pretty(&mut writer, &report).context("Writing probe report")?;
    writeln!(writer)?;
    writer.flush()?;

    if let Some(path) = &args.output {
        info!(
            "Probed {} column(s) of '{}' into {path:?}",
            report.columns.len(),
            report.table
        );
    } else {
        info!(
            "Probed {} column(s) of '{}'",
            report.columns.len(),
            report.table
        );
    }
    Ok(())
}
