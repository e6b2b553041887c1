//! I/O helpers for the delimited-text row source.
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader construction**: headerless, flexible `csv` readers so ragged
//!   rows and header detection stay in the core's hands.
//! - **stdin**: the `-` path convention routes through standard input.
//!
//! [`CsvRowSource`] is the only place a CSV file is read; it satisfies the row
//! source contract the replay buffer expects.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::{
    cell::{Row, row_from_strings},
    error::{Result, RowSetError},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> anyhow::Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> anyhow::Result<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> anyhow::Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Lazily yields decoded CSV records as rows of raw string cells.
///
/// Read and decode failures are yielded as [`RowSetError::Source`] items
/// carrying the one-based record number; the source never stops silently on a
/// bad record.
pub struct CsvRowSource<R>
where
    R: Read,
{
    reader: csv::Reader<R>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    records_read: usize,
}

impl<R> CsvRowSource<R>
where
    R: Read,
{
    pub fn new(reader: R, delimiter: u8, encoding: &'static Encoding) -> Self {
        Self {
            reader: open_csv_reader(reader, delimiter),
            encoding,
            record: csv::ByteRecord::new(),
            records_read: 0,
        }
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }
}

impl<R> Iterator for CsvRowSource<R>
where
    R: Read,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record_number = self.records_read + 1;
        match self.reader.read_byte_record(&mut self.record) {
            Ok(true) => {
                self.records_read += 1;
                Some(
                    decode_record(&self.record, self.encoding)
                        .map(row_from_strings)
                        .map_err(|err| RowSetError::source_error(record_number, err)),
                )
            }
            Ok(false) => None,
            Err(err) => {
                self.records_read += 1;
                Some(Err(RowSetError::source_error(record_number, err)))
            }
        }
    }
}
