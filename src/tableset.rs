//! Named collections of row sets sourced from one container-like input.

use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{
    cell::Row,
    guess::DEFAULT_SAMPLE_WINDOW,
    io_utils::{self, CsvRowSource},
    rowset::RowSet,
};

/// A bundle of tables, such as the sheets of a workbook or the single table of
/// a delimited text file.
pub trait TableSet {
    type Source: Iterator<Item = crate::Result<Row>>;

    fn tables(&self) -> &[RowSet<Self::Source>];

    fn tables_mut(&mut self) -> &mut [RowSet<Self::Source>];

    fn into_tables(self) -> Vec<RowSet<Self::Source>>;

    fn table_names(&self) -> Vec<&str> {
        self.tables().iter().map(RowSet::name).collect()
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut RowSet<Self::Source>> {
        self.tables_mut().iter_mut().find(|table| table.name() == name)
    }
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; resolved from the file extension when absent.
    pub delimiter: Option<u8>,
    /// Encoding label understood by `encoding_rs`; UTF-8 when absent.
    pub encoding: Option<String>,
    /// Sample window handed to the row set.
    pub window: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            window: DEFAULT_SAMPLE_WINDOW,
        }
    }
}

pub type CsvSource = CsvRowSource<Box<dyn Read>>;

/// Delimited text holds exactly one table.
pub struct CsvTableSet {
    tables: Vec<RowSet<CsvSource>>,
}

impl CsvTableSet {
    /// Wraps an already-open stream. Nothing is read until the table is
    /// sampled or iterated.
    pub fn from_fileobj<R>(name: &str, reader: R, options: &CsvOptions) -> Result<Self>
    where
        R: Read + 'static,
    {
        let delimiter = options.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
        Self::build(name, Box::new(reader), delimiter, options)
    }

    /// Opens `path` (or stdin for `-`) and names the table after the file stem.
    pub fn from_path(path: &Path, options: &CsvOptions) -> Result<Self> {
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        let reader = io_utils::open_input(path)?;
        let name = table_name_for(path);
        info!(
            "Opening table '{name}' from {path:?} with delimiter '{}'",
            crate::printable_delimiter(delimiter)
        );
        Self::build(&name, reader, delimiter, options)
    }

    fn build(
        name: &str,
        reader: Box<dyn Read>,
        delimiter: u8,
        options: &CsvOptions,
    ) -> Result<Self> {
        let encoding = io_utils::resolve_encoding(options.encoding.as_deref())
            .with_context(|| format!("Resolving encoding for table '{name}'"))?;
        let source = CsvRowSource::new(reader, delimiter, encoding);
        let table = RowSet::new(name, source).with_window(options.window);
        Ok(Self {
            tables: vec![table],
        })
    }

    /// The single table of the file.
    pub fn into_table(self) -> Option<RowSet<CsvSource>> {
        self.tables.into_iter().next()
    }
}

impl TableSet for CsvTableSet {
    type Source = CsvSource;

    fn tables(&self) -> &[RowSet<CsvSource>] {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut [RowSet<CsvSource>] {
        &mut self.tables
    }

    fn into_tables(self) -> Vec<RowSet<CsvSource>> {
        self.tables
    }
}

fn table_name_for(path: &Path) -> String {
    if io_utils::is_dash(path) {
        return "stdin".to_string();
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn table_names_follow_file_stem() {
        assert_eq!(table_name_for(Path::new("data/orders.csv")), "orders");
        assert_eq!(table_name_for(Path::new("-")), "stdin");
    }

    #[test]
    fn fileobj_tableset_exposes_one_lazy_table() {
        let options = CsvOptions::default();
        let mut set =
            CsvTableSet::from_fileobj("inline", Cursor::new("a,b\n1,2\n"), &options).unwrap();
        assert_eq!(set.table_names(), vec!["inline"]);
        let table = set.table_mut("inline").expect("table");
        assert_eq!(table.rows_read(), 0);
        assert_eq!(table.iter().unwrap().count(), 2);
        assert!(set.table_mut("missing").is_none());
    }

    #[test]
    fn bad_encoding_label_is_reported() {
        let options = CsvOptions {
            encoding: Some("nope".to_string()),
            ..CsvOptions::default()
        };
        assert!(CsvTableSet::from_fileobj("x", Cursor::new(""), &options).is_err());
    }
}
