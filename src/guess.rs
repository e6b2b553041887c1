//! Heuristics that run over a sampled window before iteration starts.
//!
//! - [`guess_types`] picks, per column, the most specific [`CellType`] whose
//!   match ratio over the non-empty sampled values meets the policy threshold.
//! - [`guess_header_row`] looks for the row that holds column names.
//!
//! Neither heuristic fails: the worst case for types is [`CellType::String`],
//! and the worst case for headers is `None`.

use log::debug;

use crate::{
    cell::Row,
    data::is_placeholder_token,
    error::{Result, RowSetError},
    types::CellType,
};

pub const DEFAULT_SAMPLE_WINDOW: usize = 1000;
pub const DEFAULT_HEADER_TOLERANCE: usize = 1;
const HEADER_DETECTION_SAMPLE_ROWS: usize = 6;

const COMMON_HEADER_TOKENS: &[&str] = &[
    "address",
    "amount",
    "category",
    "city",
    "code",
    "country",
    "created",
    "currency",
    "date",
    "description",
    "email",
    "first_name",
    "id",
    "item",
    "last_name",
    "name",
    "phone",
    "price",
    "quantity",
    "state",
    "status",
    "total",
    "type",
    "updated",
    "zip",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GuessPolicy {
    /// Fraction of non-empty sampled values that must pass a type's test.
    pub threshold: f64,
    /// Number of rows sampled from the source.
    pub window: usize,
    /// Treat tokens such as `N/A` or `null` as empty while guessing.
    pub placeholders_as_empty: bool,
}

impl Default for GuessPolicy {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            window: DEFAULT_SAMPLE_WINDOW,
            placeholders_as_empty: true,
        }
    }
}

impl GuessPolicy {
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        self.threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RowSetError::InvalidPolicy(format!(
                "threshold must be within 0.0..=1.0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    fn counts_as_empty(&self, value: &str) -> bool {
        value.trim().is_empty() || (self.placeholders_as_empty && is_placeholder_token(value))
    }
}

#[derive(Debug, Clone)]
struct TypeTally {
    non_empty: usize,
    matches: Vec<usize>,
}

impl TypeTally {
    fn new() -> Self {
        Self {
            non_empty: 0,
            matches: vec![0; CellType::by_specificity().len()],
        }
    }

    fn update(&mut self, value: &str) {
        self.non_empty += 1;
        for (idx, candidate) in CellType::by_specificity().iter().enumerate() {
            if candidate.test(value) {
                self.matches[idx] += 1;
            }
        }
    }

    fn decide(&self, threshold: f64) -> CellType {
        if self.non_empty == 0 {
            return CellType::String;
        }
        CellType::by_specificity()
            .iter()
            .zip(&self.matches)
            .find(|(candidate, matches)| {
                **candidate == CellType::String
                    || (**matches > 0
                        && (**matches as f64) / (self.non_empty as f64) >= threshold)
            })
            .map(|(candidate, _)| *candidate)
            .unwrap_or(CellType::String)
    }
}

/// Guesses one type per column from `rows`.
///
/// The column count is the width of the widest row; short rows simply
/// contribute nothing to the columns they lack. The threshold is assumed valid
/// (see [`GuessPolicy::validate`]).
pub fn guess_types(rows: &[Row], policy: &GuessPolicy) -> Vec<CellType> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut tallies = vec![TypeTally::new(); width];

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let Some(text) = cell.text() else {
                continue;
            };
            if policy.counts_as_empty(&text) {
                continue;
            }
            tallies[idx].update(&text);
        }
    }

    let types: Vec<CellType> = tallies
        .iter()
        .map(|tally| tally.decide(policy.threshold))
        .collect();
    debug!(
        "Guessed {} column type(s) from {} sampled row(s): {:?}",
        types.len(),
        rows.len(),
        types
    );
    types
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderGuess {
    /// Index of the header row within the sample.
    pub offset: usize,
    pub headers: Vec<String>,
}

/// Finds the header row among the first `tolerance` sampled rows.
///
/// The widest row (most non-empty cells, earliest on ties) is the candidate; it
/// is accepted only when its values read as names rather than data compared
/// with the rows that follow it.
pub fn guess_header_row(rows: &[Row], tolerance: usize) -> Option<HeaderGuess> {
    let texts: Vec<Vec<String>> = rows.iter().map(|row| row_texts(row)).collect();
    let window = tolerance.max(1).min(texts.len());

    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in texts.iter().take(window).enumerate() {
        let filled = row.iter().filter(|value| !value.trim().is_empty()).count();
        if filled > 0 && best.is_none_or(|(_, widest)| filled > widest) {
            best = Some((idx, filled));
        }
    }
    let (offset, _) = best?;

    let candidate = &texts[offset];
    let following_end = (offset + 1 + HEADER_DETECTION_SAMPLE_ROWS).min(texts.len());
    let following = &texts[offset + 1..following_end];
    if !infer_has_header(candidate, following) {
        debug!("Row {offset} does not look like a header row");
        return None;
    }
    debug!("Detected header row at offset {offset}");
    Some(HeaderGuess {
        offset,
        headers: candidate.iter().map(|value| value.trim().to_string()).collect(),
    })
}

fn row_texts(row: &Row) -> Vec<String> {
    row.iter()
        .map(|cell| cell.text().unwrap_or_default())
        .collect()
}

fn token_is_common_header(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }
    let sanitized = normalized
        .chars()
        .map(|ch| match ch {
            ' ' | '-' | '/' => '_',
            other => other,
        })
        .collect::<String>();
    COMMON_HEADER_TOKENS
        .iter()
        .any(|token| normalized == *token || sanitized == *token)
}

fn value_is_data_like(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    CellType::by_specificity()
        .iter()
        .filter(|candidate| **candidate != CellType::String)
        .any(|candidate| candidate.test(trimmed))
}

fn value_is_header_like(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || value_is_data_like(trimmed) {
        return false;
    }
    trimmed.chars().any(|c| c.is_alphabetic()) || token_is_common_header(trimmed)
}

fn header_tokens_match_dictionary(row: &[String]) -> bool {
    row.iter()
        .filter(|value| token_is_common_header(value))
        .count()
        >= 2
}

fn infer_has_header(first_row: &[String], other_rows: &[Vec<String>]) -> bool {
    let header_like_first = first_row
        .iter()
        .filter(|value| value_is_header_like(value))
        .count();
    let data_like_first = first_row
        .iter()
        .filter(|value| value_is_data_like(value))
        .count();

    if header_like_first == 0 || data_like_first > header_like_first {
        return false;
    }

    if other_rows.is_empty() {
        return header_like_first >= 2 || header_tokens_match_dictionary(first_row);
    }

    let mut header_signal = 0usize;
    let mut data_signal = 0usize;

    for (column, first_value) in first_row.iter().enumerate() {
        let other_has_data = other_rows.iter().any(|row| {
            row.get(column)
                .is_some_and(|value| value_is_data_like(value))
        });
        if !other_has_data {
            continue;
        }
        if value_is_header_like(first_value) {
            header_signal += 1;
        } else if value_is_data_like(first_value) {
            data_signal += 1;
        }
    }

    if header_signal != data_signal {
        return header_signal > data_signal;
    }

    if header_tokens_match_dictionary(first_row) {
        return true;
    }
    header_like_first > data_like_first
}
