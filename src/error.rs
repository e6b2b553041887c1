//! Error taxonomy for row sources, the replay buffer, and the processor
//! pipeline.
//!
//! Every failure is reported at the point it happens. The only "quiet" outcome
//! in the crate is a processor returning `Ok(None)`, which drops a row on
//! purpose and is not an error.

use thiserror::Error;

use crate::types::CellType;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RowSetError>;

#[derive(Debug, Clone, Error)]
pub enum RowSetError {
    /// The once-only source has already been handed to a raw cursor.
    #[error("Row source already consumed; a row set can only be streamed once")]
    SourceExhausted,

    #[error("Failed to cast '{value}' as {target}{}", column_suffix(.column))]
    Cast {
        column: Option<String>,
        value: String,
        target: CellType,
    },

    #[error("No column headers defined")]
    MissingHeaders,

    /// The format collaborator could not produce the next row.
    #[error("Reading source: {0}")]
    Source(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),
}

fn column_suffix(column: &Option<String>) -> String {
    match column {
        Some(name) => format!(" in column '{name}'"),
        None => String::new(),
    }
}

impl RowSetError {
    pub fn source_error(row: usize, err: impl std::fmt::Display) -> Self {
        RowSetError::Source(format!("row {row}: {err}"))
    }

    pub fn is_cast(&self) -> bool {
        matches!(self, RowSetError::Cast { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_error_mentions_column_when_known() {
        let err = RowSetError::Cast {
            column: Some("amount".to_string()),
            value: "abc".to_string(),
            target: CellType::Integer,
        };
        assert_eq!(
            err.to_string(),
            "Failed to cast 'abc' as integer in column 'amount'"
        );
        assert!(err.is_cast());
    }

    #[test]
    fn missing_headers_message_is_stable() {
        assert_eq!(
            RowSetError::MissingHeaders.to_string(),
            "No column headers defined"
        );
    }
}
