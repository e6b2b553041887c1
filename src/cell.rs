//! The atomic value container and the row alias built on it.

use std::fmt;

use serde::Serialize;

use crate::{
    data::Value,
    error::{Result, RowSetError},
    types::CellType,
};

/// One row of a table: cells positionally aligned across the row set.
pub type Row = Vec<Cell>;

/// A value at a row/column position.
///
/// A cell always carries a type; cells built from raw source data are
/// [`CellType::String`] until a cast replaces them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: Option<Value>,
    pub cell_type: CellType,
    pub column: Option<String>,
    pub column_autogenerated: bool,
}

impl Cell {
    pub fn new(value: Option<Value>) -> Self {
        Self {
            value,
            cell_type: CellType::String,
            column: None,
            column_autogenerated: false,
        }
    }

    /// Builds an untyped cell from raw source text.
    pub fn raw(value: impl Into<String>) -> Self {
        Self::new(Some(Value::String(value.into())))
    }

    pub fn null() -> Self {
        Self::new(None)
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// True when there is no value or its rendering is only whitespace.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            None => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(other) => other.as_display().trim().is_empty(),
        }
    }

    /// Raw text of the cell as it should be fed to [`CellType::test`].
    pub fn text(&self) -> Option<String> {
        self.value.as_ref().map(Value::as_display)
    }

    /// Produces a new cell holding `value` cast to `target`. The receiver is
    /// left untouched so cached sample rows never observe cast results.
    pub fn recast(&self, target: CellType) -> Result<Cell> {
        let value = match &self.value {
            Some(value) => target.cast_value(value).map_err(|err| match err {
                RowSetError::Cast { value, target, .. } => RowSetError::Cast {
                    column: self.column.clone(),
                    value,
                    target,
                },
                other => other,
            })?,
            None => None,
        };
        Ok(Cell {
            value,
            cell_type: target,
            column: self.column.clone(),
            column_autogenerated: self.column_autogenerated,
        })
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self
            .value
            .as_ref()
            .map(Value::as_display)
            .unwrap_or_default();
        match &self.column {
            Some(column) => write!(f, "<Cell({column}={}:{value})>", self.cell_type),
            None => write!(f, "<Cell({}:{value})>", self.cell_type),
        }
    }
}

/// Converts one raw record from a format collaborator into a row of string
/// cells.
pub fn row_from_strings<I, S>(values: I) -> Row
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Cell::raw).collect()
}

/// Adapts an iterator of raw string records into a row source.
pub fn rows_from_records<J, R, S>(records: J) -> impl Iterator<Item = Result<Row>>
where
    J: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: Into<String>,
{
    records
        .into_iter()
        .map(|record| Ok(row_from_strings(record)))
}
