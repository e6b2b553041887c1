//! Windowed read-ahead over a once-only row source.
//!
//! A [`ReplayBuffer`] is the sole owner of the physical source. It lets callers
//! look at the first rows of the source with [`ReplayBuffer::sample`] and then
//! hands out exactly one [`Raw`] cursor that replays the cached rows before
//! continuing with the rows still in the source. Across any number of sample
//! calls followed by one full drain, every source row is observed exactly once
//! and in source order. A source error met while sampling stops the buffer at
//! that row: later samples reaching past it report the same error, and the raw
//! cursor yields it in its original position.

use std::iter::Fuse;

use log::debug;

use crate::{
    cell::Row,
    error::{Result, RowSetError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Rows may still be sampled into the buffer.
    Buffering,
    /// A raw cursor has been handed out.
    Streaming,
    /// The raw cursor reached the end of the source.
    Exhausted,
}

pub struct ReplayBuffer<I>
where
    I: Iterator<Item = Result<Row>>,
{
    source: Fuse<I>,
    buffer: Vec<Row>,
    state: BufferState,
    rows_read: usize,
    source_done: bool,
    failure: Option<RowSetError>,
}

impl<I> ReplayBuffer<I>
where
    I: Iterator<Item = Result<Row>>,
{
    pub fn new(source: I) -> Self {
        Self {
            source: source.fuse(),
            buffer: Vec::new(),
            state: BufferState::Buffering,
            rows_read: 0,
            source_done: false,
            failure: None,
        }
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Number of rows physically pulled from the source so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Rows currently cached by previous sample calls.
    pub fn buffered(&self) -> &[Row] {
        &self.buffer
    }

    /// Returns the first `n` rows of the source, or all of them when the
    /// source is shorter. Only rows beyond the current cache are read.
    pub fn sample(&mut self, n: usize) -> Result<&[Row]> {
        if self.state != BufferState::Buffering {
            return Err(RowSetError::SourceExhausted);
        }
        if self.buffer.len() < n && !self.source_done && self.failure.is_none() {
            let wanted = n - self.buffer.len();
            debug!(
                "Extending sample buffer by up to {wanted} row(s) (cached {})",
                self.buffer.len()
            );
            self.buffer.reserve(wanted);
            while self.buffer.len() < n {
                match self.source.next() {
                    Some(Ok(row)) => {
                        self.rows_read += 1;
                        self.buffer.push(row);
                    }
                    Some(Err(err)) => {
                        self.rows_read += 1;
                        debug!(
                            "Source failed after {} buffered row(s): {err}",
                            self.buffer.len()
                        );
                        self.failure = Some(err);
                        break;
                    }
                    None => {
                        self.source_done = true;
                        debug!("Source ended after {} row(s) while sampling", self.rows_read);
                        break;
                    }
                }
            }
        }
        if let Some(err) = self.failure.as_ref().filter(|_| self.buffer.len() < n) {
            return Err(err.clone());
        }
        let end = n.min(self.buffer.len());
        Ok(&self.buffer[..end])
    }

    /// Hands out the single cursor over every row: cached rows first, then the
    /// remainder of the source, pulled lazily.
    pub fn raw(&mut self) -> Result<Raw<'_, I>> {
        if self.state != BufferState::Buffering {
            return Err(RowSetError::SourceExhausted);
        }
        self.state = BufferState::Streaming;
        let cached = std::mem::take(&mut self.buffer);
        let failure = self.failure.take();
        debug!("Streaming rows with {} replayed from the sample", cached.len());
        Ok(Raw {
            replay: cached.into_iter(),
            failure,
            owner: self,
        })
    }
}

/// One-shot cursor returned by [`ReplayBuffer::raw`].
pub struct Raw<'a, I>
where
    I: Iterator<Item = Result<Row>>,
{
    replay: std::vec::IntoIter<Row>,
    failure: Option<RowSetError>,
    owner: &'a mut ReplayBuffer<I>,
}

impl<I> Iterator for Raw<'_, I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(row) = self.replay.next() {
            return Some(Ok(row));
        }
        if let Some(err) = self.failure.take() {
            return Some(Err(err));
        }
        if self.owner.source_done {
            self.owner.state = BufferState::Exhausted;
            return None;
        }
        match self.owner.source.next() {
            Some(item) => {
                self.owner.rows_read += 1;
                Some(item)
            }
            None => {
                self.owner.source_done = true;
                self.owner.state = BufferState::Exhausted;
                None
            }
        }
    }
}
