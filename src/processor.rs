//! Per-row transform and filter steps applied during iteration.
//!
//! A [`Processor`] receives the row set's shared [`RowContext`] and one owned
//! row, and returns the row to pass on (`Ok(Some(row))`), a request to drop it
//! (`Ok(None)`), or an error. The [`Pipeline`] runs processors strictly in
//! registration order and stops at the first drop or error. A processor sees
//! only the row it is given; it never reaches into the source.

use log::warn;

use crate::{
    cell::{Cell, Row},
    data::{Value, is_placeholder_token},
    error::Result,
    types::CellType,
};

/// Row-set level state shared by every processor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowContext {
    pub name: String,
    pub typed: bool,
    pub types: Option<Vec<CellType>>,
    pub column_headers: Option<Vec<String>>,
    /// Zero-based position of the current row in the raw stream.
    pub row_index: usize,
}

pub trait Processor {
    fn process(&mut self, ctx: &mut RowContext, row: Row) -> Result<Option<Row>>;
}

impl<F> Processor for F
where
    F: FnMut(&mut RowContext, Row) -> Result<Option<Row>>,
{
    fn process(&mut self, ctx: &mut RowContext, row: Row) -> Result<Option<Row>> {
        self(ctx, row)
    }
}

/// Wraps a closure so its argument types are inferred from the processor
/// signature.
pub fn from_fn<F>(f: F) -> F
where
    F: FnMut(&mut RowContext, Row) -> Result<Option<Row>>,
{
    f
}

/// Ordered, append-only chain of processors.
///
/// The header step is the one exception: it keeps the position it was first
/// installed at and a later header step replaces it there.
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
    header_slot: Option<usize>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, processor: P)
    where
        P: Processor + 'static,
    {
        self.processors.push(Box::new(processor));
    }

    pub fn set_header_step(&mut self, step: HeaderProcessor) {
        match self.header_slot {
            Some(idx) => self.processors[idx] = Box::new(step),
            None => {
                self.header_slot = Some(self.processors.len());
                self.processors.push(Box::new(step));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn run(&mut self, ctx: &mut RowContext, row: Row) -> Result<Option<Row>> {
        let mut current = row;
        for processor in &mut self.processors {
            match processor.process(ctx, current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

pub fn generate_field_name(idx: usize) -> String {
    format!("field_{idx}")
}

/// Drops the first `skip` rows (the header block) and names every remaining
/// cell after its column. Cells without a usable header get a generated name
/// and `column_autogenerated` set. Rows shorter than the header are padded
/// with null cells so every row lines up with the same columns.
#[derive(Debug, Clone)]
pub struct HeaderProcessor {
    headers: Vec<String>,
    autogenerated: bool,
    skip: usize,
    seen: usize,
}

impl HeaderProcessor {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            autogenerated: false,
            skip: 0,
            seen: 0,
        }
    }

    /// Names `width` columns `field_0`, `field_1`, ... and flags them as
    /// generated.
    pub fn generated(width: usize) -> Self {
        Self {
            autogenerated: true,
            ..Self::new((0..width).map(generate_field_name).collect())
        }
    }

    pub fn skip(mut self, rows: usize) -> Self {
        self.skip = rows;
        self
    }

    fn header_for(&self, idx: usize) -> Option<&str> {
        self.headers
            .get(idx)
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
    }

    fn name(&self, idx: usize, cell: &mut Cell) {
        match self.header_for(idx) {
            Some(name) => {
                cell.column = Some(name.to_string());
                cell.column_autogenerated = self.autogenerated;
            }
            None => {
                cell.column = Some(generate_field_name(idx));
                cell.column_autogenerated = true;
            }
        }
    }
}

impl Processor for HeaderProcessor {
    fn process(&mut self, _ctx: &mut RowContext, mut row: Row) -> Result<Option<Row>> {
        if self.seen < self.skip {
            self.seen += 1;
            return Ok(None);
        }
        if row.len() < self.headers.len() {
            row.resize_with(self.headers.len(), Cell::null);
        }
        for (idx, cell) in row.iter_mut().enumerate() {
            self.name(idx, cell);
        }
        Ok(Some(row))
    }
}

/// Drops the first `offset` rows that reach it.
#[derive(Debug, Clone)]
pub struct OffsetProcessor {
    offset: usize,
    seen: usize,
}

impl OffsetProcessor {
    pub fn new(offset: usize) -> Self {
        Self { offset, seen: 0 }
    }
}

impl Processor for OffsetProcessor {
    fn process(&mut self, _ctx: &mut RowContext, row: Row) -> Result<Option<Row>> {
        if self.seen < self.offset {
            self.seen += 1;
            return Ok(None);
        }
        Ok(Some(row))
    }
}

/// Passes at most `limit` rows.
#[derive(Debug, Clone)]
pub struct LimitProcessor {
    limit: usize,
    passed: usize,
}

impl LimitProcessor {
    pub fn new(limit: usize) -> Self {
        Self { limit, passed: 0 }
    }
}

impl Processor for LimitProcessor {
    fn process(&mut self, _ctx: &mut RowContext, row: Row) -> Result<Option<Row>> {
        if self.passed >= self.limit {
            return Ok(None);
        }
        self.passed += 1;
        Ok(Some(row))
    }
}

/// What the cast processor does when a value does not fit its column type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CastPolicy {
    /// Fail the row; the error is yielded to the consumer.
    #[default]
    Strict,
    /// Replace the value with null and keep going.
    NullOnError,
}

/// Replaces every cell with a new cell cast to the row set's resolved types.
/// Rows pass through unchanged while no types are resolved.
///
/// Placeholder tokens such as `N/A` cast to null for every non-string column
/// unless disabled, matching how type guessing counts them.
#[derive(Debug, Clone)]
pub struct TypeCastProcessor {
    policy: CastPolicy,
    placeholders_as_empty: bool,
}

impl TypeCastProcessor {
    pub fn new(policy: CastPolicy) -> Self {
        Self {
            policy,
            placeholders_as_empty: true,
        }
    }

    pub fn placeholders_as_empty(mut self, enabled: bool) -> Self {
        self.placeholders_as_empty = enabled;
        self
    }

    fn is_placeholder(&self, cell: &Cell, target: CellType) -> bool {
        self.placeholders_as_empty
            && target != CellType::String
            && matches!(&cell.value, Some(Value::String(raw)) if is_placeholder_token(raw))
    }
}

impl Default for TypeCastProcessor {
    fn default() -> Self {
        Self::new(CastPolicy::default())
    }
}

impl Processor for TypeCastProcessor {
    fn process(&mut self, ctx: &mut RowContext, row: Row) -> Result<Option<Row>> {
        let Some(types) = ctx.types.as_ref() else {
            return Ok(Some(row));
        };
        let mut cast = Vec::with_capacity(row.len());
        for (idx, cell) in row.iter().enumerate() {
            let target = types.get(idx).copied().unwrap_or(CellType::String);
            if self.is_placeholder(cell, target) {
                cast.push(null_like(cell, target));
                continue;
            }
            match cell.recast(target) {
                Ok(next) => cast.push(next),
                Err(err) if err.is_cast() && self.policy == CastPolicy::NullOnError => {
                    warn!("Row {}: {err}; substituting null", ctx.row_index);
                    cast.push(null_like(cell, target));
                }
                Err(err) => return Err(err),
            }
        }
        ctx.typed = true;
        Ok(Some(cast))
    }
}

fn null_like(cell: &Cell, target: CellType) -> Cell {
    Cell {
        value: None,
        cell_type: target,
        column: cell.column.clone(),
        column_autogenerated: cell.column_autogenerated,
    }
}

/// Drops rows in which every cell is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipEmptyProcessor;

impl Processor for SkipEmptyProcessor {
    fn process(&mut self, _ctx: &mut RowContext, row: Row) -> Result<Option<Row>> {
        if row.iter().all(Cell::is_empty) {
            return Ok(None);
        }
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cell::row_from_strings, data::Value, error::RowSetError};
    use std::{cell::RefCell, rc::Rc};

    fn run_all(pipeline: &mut Pipeline, ctx: &mut RowContext, rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                ctx.row_index = idx;
                pipeline.run(ctx, row).expect("pipeline")
            })
            .collect()
    }

    fn texts(rows: &[Row]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.text().unwrap_or_default()).collect())
            .collect()
    }

    #[test]
    fn processors_run_in_order_and_drop_short_circuits() {
        let mut pipeline = Pipeline::new();
        pipeline.register(from_fn(|ctx, row| {
            Ok((ctx.row_index % 2 == 1).then_some(row))
        }));
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);
        pipeline.register(from_fn(move |ctx, row: Row| {
            seen.borrow_mut().push(ctx.row_index);
            Ok(Some(
                row.into_iter()
                    .map(|cell| Cell::raw(cell.text().unwrap_or_default().to_uppercase()))
                    .collect(),
            ))
        }));

        let rows = vec![
            row_from_strings(["r0"]),
            row_from_strings(["r1"]),
            row_from_strings(["r2"]),
            row_from_strings(["r3"]),
        ];
        let mut ctx = RowContext::default();
        let out = run_all(&mut pipeline, &mut ctx, rows);

        assert_eq!(texts(&out), vec![vec!["R1"], vec!["R3"]]);
        assert_eq!(*calls.borrow(), vec![1, 3]);
    }

    #[test]
    fn header_processor_skips_and_names_columns() {
        let mut pipeline = Pipeline::new();
        let headers = vec!["id".to_string(), " ".to_string()];
        pipeline.register(HeaderProcessor::new(headers).skip(1));
        let rows = vec![
            row_from_strings(["id", "", ""]),
            row_from_strings(["1", "a", "b"]),
        ];
        let mut ctx = RowContext::default();
        let out = run_all(&mut pipeline, &mut ctx, rows);

        assert_eq!(out.len(), 1);
        let row = &out[0];
        assert_eq!(row[0].column.as_deref(), Some("id"));
        assert!(!row[0].column_autogenerated);
        assert_eq!(row[1].column.as_deref(), Some("field_1"));
        assert!(row[1].column_autogenerated);
        assert_eq!(row[2].column.as_deref(), Some("field_2"));
        assert!(row[2].column_autogenerated);
    }

    #[test]
    fn header_processor_pads_short_rows() {
        let mut pipeline = Pipeline::new();
        let headers = vec!["id".to_string(), "name".to_string(), "city".to_string()];
        pipeline.register(HeaderProcessor::new(headers));
        let mut ctx = RowContext::default();
        let out = run_all(&mut pipeline, &mut ctx, vec![row_from_strings(["7"])]);

        assert_eq!(out[0].len(), 3);
        assert_eq!(out[0][2].value, None);
        assert_eq!(out[0][2].column.as_deref(), Some("city"));
        assert!(!out[0][2].column_autogenerated);
    }

    #[test]
    fn generated_headers_are_flagged() {
        let mut pipeline = Pipeline::new();
        pipeline.register(HeaderProcessor::generated(2));
        let mut ctx = RowContext::default();
        let out = run_all(&mut pipeline, &mut ctx, vec![row_from_strings(["1"])]);

        assert_eq!(out[0].len(), 2);
        assert_eq!(out[0][1].column.as_deref(), Some("field_1"));
        assert!(out[0].iter().all(|cell| cell.column_autogenerated));
    }

    #[test]
    fn header_step_is_replaced_in_place() {
        let mut pipeline = Pipeline::new();
        pipeline.register(SkipEmptyProcessor);
        pipeline.set_header_step(HeaderProcessor::new(vec!["a".to_string()]).skip(1));
        pipeline.register(LimitProcessor::new(10));
        pipeline.set_header_step(HeaderProcessor::new(vec!["b".to_string()]).skip(1));
        assert_eq!(pipeline.len(), 3);

        let rows = vec![row_from_strings(["h"]), row_from_strings(["1"])];
        let mut ctx = RowContext::default();
        let out = run_all(&mut pipeline, &mut ctx, rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0][0].column.as_deref(), Some("b"));
    }

    #[test]
    fn placeholders_cast_to_null_for_typed_columns() {
        let mut processor = TypeCastProcessor::new(CastPolicy::Strict);
        let mut ctx = RowContext {
            types: Some(vec![CellType::Integer, CellType::String]),
            ..RowContext::default()
        };
        let row = processor
            .process(&mut ctx, row_from_strings(["N/A", "N/A"]))
            .unwrap()
            .unwrap();
        assert_eq!(row[0].value, None);
        assert_eq!(row[0].cell_type, CellType::Integer);
        assert_eq!(row[1].value, Some(Value::from("N/A")));

        let mut exact = TypeCastProcessor::new(CastPolicy::Strict).placeholders_as_empty(false);
        let err = exact
            .process(&mut ctx, row_from_strings(["N/A", "x"]))
            .unwrap_err();
        assert!(err.is_cast());
    }

    #[test]
    fn offset_and_limit_bound_the_stream() {
        let mut pipeline = Pipeline::new();
        pipeline.register(OffsetProcessor::new(1));
        pipeline.register(LimitProcessor::new(2));
        let rows = (0..5).map(|i| row_from_strings([i.to_string()])).collect();
        let mut ctx = RowContext::default();
        let out = run_all(&mut pipeline, &mut ctx, rows);
        assert_eq!(texts(&out), vec![vec!["1"], vec!["2"]]);
    }

    #[test]
    fn type_cast_replaces_cells_and_marks_typed() {
        let mut pipeline = Pipeline::new();
        pipeline.register(TypeCastProcessor::default());
        let mut ctx = RowContext {
            types: Some(vec![CellType::Integer, CellType::Boolean]),
            ..RowContext::default()
        };
        let out = run_all(&mut pipeline, &mut ctx, vec![row_from_strings(["5", "yes"])]);
        assert_eq!(out[0][0].value, Some(Value::Integer(5)));
        assert_eq!(out[0][0].cell_type, CellType::Integer);
        assert_eq!(out[0][1].value, Some(Value::Boolean(true)));
        assert!(ctx.typed);
    }

    #[test]
    fn strict_cast_propagates_errors() {
        let mut processor = TypeCastProcessor::new(CastPolicy::Strict);
        let mut ctx = RowContext {
            types: Some(vec![CellType::Integer]),
            ..RowContext::default()
        };
        let err = processor
            .process(&mut ctx, row_from_strings(["abc"]))
            .unwrap_err();
        assert!(matches!(err, RowSetError::Cast { .. }));
    }

    #[test]
    fn lenient_cast_substitutes_null() {
        let mut processor = TypeCastProcessor::new(CastPolicy::NullOnError);
        let mut ctx = RowContext {
            types: Some(vec![CellType::Integer, CellType::Integer]),
            ..RowContext::default()
        };
        let row = processor
            .process(&mut ctx, row_from_strings(["abc", "4"]))
            .unwrap()
            .unwrap();
        assert_eq!(row[0].value, None);
        assert_eq!(row[0].cell_type, CellType::Integer);
        assert_eq!(row[1].value, Some(Value::Integer(4)));
    }

    #[test]
    fn cast_without_types_is_a_no_op() {
        let mut processor = TypeCastProcessor::default();
        let mut ctx = RowContext::default();
        let row = processor
            .process(&mut ctx, row_from_strings(["x"]))
            .unwrap()
            .unwrap();
        assert_eq!(row[0].cell_type, CellType::String);
        assert!(!ctx.typed);
    }

    #[test]
    fn skip_empty_drops_blank_rows() {
        let mut processor = SkipEmptyProcessor;
        let mut ctx = RowContext::default();
        assert!(
            processor
                .process(&mut ctx, row_from_strings(["", "  "]))
                .unwrap()
                .is_none()
        );
        assert!(
            processor
                .process(&mut ctx, row_from_strings(["", "x"]))
                .unwrap()
                .is_some()
        );
    }
}
