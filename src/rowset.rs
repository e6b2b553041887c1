//! The consumer-facing table: a replay buffer over a once-only source plus the
//! processor pipeline threaded through every row.
//!
//! Typical flow:
//!
//! ```no_run
//! use rowstream::{GuessPolicy, RowSet, CastPolicy, cell::rows_from_records};
//!
//! let records = vec![vec!["id", "name"], vec!["1", "Alice"], vec!["2", "Bob"]];
//! let mut table = RowSet::new("people", rows_from_records(records));
//! table.guess_headers(1)?;
//! table.guess_types(&GuessPolicy::default())?;
//! table.apply_types(CastPolicy::Strict);
//! for row in table.dicts()? {
//!     println!("{:?}", row?);
//! }
//! # Ok::<(), rowstream::RowSetError>(())
//! ```

use std::fmt;

use indexmap::IndexMap;
use log::debug;

use crate::{
    cell::Row,
    data::Value,
    error::{Result, RowSetError},
    guess::{self, DEFAULT_SAMPLE_WINDOW, GuessPolicy, HeaderGuess},
    processor::{
        CastPolicy, HeaderProcessor, Pipeline, Processor, RowContext, TypeCastProcessor,
        generate_field_name,
    },
    replay::{BufferState, Raw, ReplayBuffer},
    types::CellType,
};

pub struct RowSet<I>
where
    I: Iterator<Item = Result<Row>>,
{
    buffer: ReplayBuffer<I>,
    pipeline: Pipeline,
    ctx: RowContext,
    window: usize,
    header_offset: usize,
    placeholders_as_empty: bool,
}

impl<I> RowSet<I>
where
    I: Iterator<Item = Result<Row>>,
{
    pub fn new(name: impl Into<String>, source: I) -> Self {
        Self {
            buffer: ReplayBuffer::new(source),
            pipeline: Pipeline::new(),
            ctx: RowContext {
                name: name.into(),
                ..RowContext::default()
            },
            window: DEFAULT_SAMPLE_WINDOW,
            header_offset: 0,
            placeholders_as_empty: GuessPolicy::default().placeholders_as_empty,
        }
    }

    /// Sets the default number of rows read by [`RowSet::sample`].
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn typed(&self) -> bool {
        self.ctx.typed
    }

    pub fn types(&self) -> Option<&[CellType]> {
        self.ctx.types.as_deref()
    }

    /// Fixes the column types. They are authoritative from here on and are
    /// never re-guessed.
    pub fn set_types(&mut self, types: Vec<CellType>) {
        self.ctx.typed = true;
        self.ctx.types = Some(types);
    }

    pub fn column_headers(&self) -> Option<&[String]> {
        self.ctx.column_headers.as_deref()
    }

    /// Number of leading raw rows that belong to the header block.
    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn buffer_state(&self) -> BufferState {
        self.buffer.state()
    }

    pub fn rows_read(&self) -> usize {
        self.buffer.rows_read()
    }

    /// Appends a processor to the pipeline. Order of registration is the
    /// order of execution.
    pub fn register_processor<P>(&mut self, processor: P)
    where
        P: Processor + 'static,
    {
        self.pipeline.register(processor);
    }

    pub fn processor_count(&self) -> usize {
        self.pipeline.len()
    }

    /// The first [`RowSet::window`] raw rows, read ahead without losing them.
    pub fn sample(&mut self) -> Result<&[Row]> {
        self.buffer.sample(self.window)
    }

    pub fn sample_rows(&mut self, n: usize) -> Result<&[Row]> {
        self.buffer.sample(n)
    }

    /// Declares the header names and how many leading raw rows to drop, and
    /// installs the processor that names cells accordingly. Calling it again
    /// replaces the earlier header step.
    pub fn set_headers(&mut self, headers: Vec<String>, skip: usize) {
        self.header_offset = skip;
        self.ctx.column_headers = Some(headers.clone());
        self.pipeline
            .set_header_step(HeaderProcessor::new(headers).skip(skip));
    }

    /// Looks for a header row within the first `tolerance` sampled rows. When
    /// none is found the columns get generated names and no row is dropped.
    pub fn guess_headers(&mut self, tolerance: usize) -> Result<Option<HeaderGuess>> {
        let window = self.window;
        let sample = self.buffer.sample(window)?;
        let width = sample.iter().map(Vec::len).max().unwrap_or(0);
        let guess = guess::guess_header_row(sample, tolerance);
        match &guess {
            Some(found) => {
                debug!(
                    "RowSet '{}': header row at offset {} with {} column(s)",
                    self.ctx.name,
                    found.offset,
                    found.headers.len()
                );
                self.set_headers(found.headers.clone(), found.offset + 1);
            }
            None => self.assign_generated_headers(width),
        }
        Ok(guess)
    }

    /// Treats every row as data and names the columns `field_0`, `field_1`, ...
    /// from the widest sampled row.
    pub fn autogenerate_headers(&mut self) -> Result<()> {
        let window = self.window;
        let width = self
            .buffer
            .sample(window)?
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        self.assign_generated_headers(width);
        Ok(())
    }

    fn assign_generated_headers(&mut self, width: usize) {
        debug!(
            "RowSet '{}': no header row, generating {width} column name(s)",
            self.ctx.name
        );
        self.header_offset = 0;
        self.ctx.column_headers = Some((0..width).map(generate_field_name).collect());
        self.pipeline.set_header_step(HeaderProcessor::generated(width));
    }

    /// Guesses column types from the sampled rows below the header block,
    /// unless types are already set.
    pub fn guess_types(&mut self, policy: &GuessPolicy) -> Result<&[CellType]> {
        if self.ctx.types.is_none() {
            policy.validate()?;
            self.placeholders_as_empty = policy.placeholders_as_empty;
            let skip = self.header_offset;
            let sample = self.buffer.sample(skip + policy.window)?;
            let body = sample.get(skip..).unwrap_or_default();
            let types = guess::guess_types(body, policy);
            self.set_types(types);
        }
        Ok(self.ctx.types.as_deref().unwrap_or_default())
    }

    /// Registers the cast processor so rows come out typed. Placeholder
    /// tokens cast to null whenever the guessing policy treated them as empty.
    pub fn apply_types(&mut self, policy: CastPolicy) {
        self.pipeline.register(
            TypeCastProcessor::new(policy).placeholders_as_empty(self.placeholders_as_empty),
        );
    }

    /// Starts the single pass over the table. Fails with
    /// [`RowSetError::SourceExhausted`] when the table was already streamed.
    pub fn iter(&mut self) -> Result<Rows<'_, I>> {
        let raw = self.buffer.raw()?;
        Ok(Rows {
            raw,
            pipeline: &mut self.pipeline,
            ctx: &mut self.ctx,
            next_index: 0,
        })
    }

    /// Rows as ordered `column -> value` maps. Requires column headers.
    pub fn dicts(&mut self) -> Result<Dicts<'_, I>> {
        let headers = self
            .ctx
            .column_headers
            .clone()
            .filter(|headers| !headers.is_empty())
            .ok_or(RowSetError::MissingHeaders)?;
        Ok(Dicts {
            rows: self.iter()?,
            headers,
        })
    }
}

impl<I> fmt::Debug for RowSet<I>
where
    I: Iterator<Item = Result<Row>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowSet({})", self.ctx.name)
    }
}

/// Cursor yielding every row that survives the pipeline.
pub struct Rows<'a, I>
where
    I: Iterator<Item = Result<Row>>,
{
    raw: Raw<'a, I>,
    pipeline: &'a mut Pipeline,
    ctx: &'a mut RowContext,
    next_index: usize,
}

impl<I> Rows<'_, I>
where
    I: Iterator<Item = Result<Row>>,
{
    pub fn context(&self) -> &RowContext {
        &*self.ctx
    }
}

impl<I> Iterator for Rows<'_, I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.raw.next()?;
            self.ctx.row_index = self.next_index;
            self.next_index += 1;
            let row = match item {
                Ok(row) => row,
                Err(err) => return Some(Err(err)),
            };
            match self.pipeline.run(self.ctx, row) {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

pub type DictRow = IndexMap<String, Option<Value>>;

/// Lossy projection of [`Rows`] keyed by column name.
pub struct Dicts<'a, I>
where
    I: Iterator<Item = Result<Row>>,
{
    rows: Rows<'a, I>,
    headers: Vec<String>,
}

impl<I> Iterator for Dicts<'_, I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<DictRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(err) => return Some(Err(err)),
        };
        let mapped = row
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| {
                let key = cell.column.unwrap_or_else(|| {
                    self.headers
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| generate_field_name(idx))
                });
                (key, cell.value)
            })
            .collect();
        Some(Ok(mapped))
    }
}
