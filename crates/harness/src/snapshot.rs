//! Draining result streams into row collections
//!
//! A [`Drainer`] turns a live [`ResultStream`] into a [`ResultCollection`]
//! under one of two [`DrainPolicy`] values:
//!
//! - `Exhaustive`: read until the stream reports its end.
//! - `Bounded(n)`: read exactly `n` rows and stop, leaving anything after
//!   them unread. This never re-checks or waits beyond the blocking pulls
//!   themselves; a stream that ends early is an error.
//!
//! Each row is built according to the configured
//! [`RowShape`](crate::RowShape): from the stream's declared width, or from
//! the width the row reports. A row whose reported width disagrees with the
//! declared one is an error rather than being truncated.
//!
//! The stream is held in a [`StreamGuard`] for the whole drain and released
//! exactly once on every exit path, including errors and panics.

use convergent_core::{ResultStream, Row};
use tracing::{debug, trace, warn};

use crate::collection::ResultCollection;
use crate::config::HarnessConfig;
use crate::error::DrainError;

/// How many rows to read from a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Read every row until the stream ends
    Exhaustive,
    /// Read exactly this many rows, then stop
    Bounded(usize),
}

/// Exclusive owner of an open stream. Closes it once, on `close` or drop.
pub struct StreamGuard<S: ResultStream> {
    stream: S,
    closed: bool,
}

impl<S: ResultStream> StreamGuard<S> {
    /// Take ownership of an open stream
    pub fn new(stream: S) -> Self {
        StreamGuard {
            stream,
            closed: false,
        }
    }

    /// Access the open stream
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Release the stream now. Later calls and the drop are no-ops.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stream.close();
        }
    }

    /// Whether the stream has been released
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S: ResultStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reads rows out of result streams according to a [`HarnessConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Drainer<'c> {
    config: &'c HarnessConfig,
}

impl<'c> Drainer<'c> {
    /// Create a drainer using `config` for row limits and row tracing
    pub fn new(config: &'c HarnessConfig) -> Self {
        Drainer { config }
    }

    /// Drain `stream` into a collection, then release it.
    ///
    /// # Errors
    ///
    /// Returns a [`DrainError`] if the stream fails, a row cannot be read,
    /// a bounded drain runs out of rows, or an exhaustive drain passes the
    /// configured `row_limit`. The stream is released before returning.
    pub fn drain<S: ResultStream>(
        &self,
        stream: S,
        policy: DrainPolicy,
    ) -> Result<ResultCollection, DrainError> {
        let mut guard = StreamGuard::new(stream);
        let result = match policy {
            DrainPolicy::Exhaustive => self.read_all(guard.stream_mut()),
            DrainPolicy::Bounded(n) => self.read_exactly(guard.stream_mut(), n),
        };
        match &result {
            Ok(rows) => debug!(?policy, rows = rows.len(), "drained result stream"),
            Err(e) => warn!(?policy, error = %e, "releasing result stream after drain failure"),
        }
        guard.close();
        result
    }

    /// Read and drop every row of `stream`, then release it. Returns the
    /// number of rows consumed.
    ///
    /// Used when the query is run for its side effects rather than its rows.
    ///
    /// # Errors
    ///
    /// Returns a [`DrainError`] if the stream fails or passes `row_limit`.
    pub fn discard<S: ResultStream>(&self, stream: S) -> Result<usize, DrainError> {
        let mut guard = StreamGuard::new(stream);
        let result = self.skip_all(guard.stream_mut());
        match &result {
            Ok(n) => debug!(rows = n, "discarded result stream"),
            Err(e) => warn!(error = %e, "releasing result stream after discard failure"),
        }
        guard.close();
        result
    }

    fn read_all<S: ResultStream>(&self, stream: &mut S) -> Result<ResultCollection, DrainError> {
        let columns = stream.column_count();
        let mut rows = ResultCollection::new();
        while has_next(stream, rows.len())? {
            self.check_limit(rows.len())?;
            let row = self.read_row(stream, columns, rows.len())?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn read_exactly<S: ResultStream>(
        &self,
        stream: &mut S,
        expected: usize,
    ) -> Result<ResultCollection, DrainError> {
        let columns = stream.column_count();
        let mut rows = ResultCollection::with_capacity(expected);
        while rows.len() < expected {
            if !has_next(stream, rows.len())? {
                return Err(DrainError::Exhausted {
                    consumed: rows.len(),
                    expected,
                });
            }
            let row = self.read_row(stream, columns, rows.len())?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn skip_all<S: ResultStream>(&self, stream: &mut S) -> Result<usize, DrainError> {
        let mut consumed = 0;
        while has_next(stream, consumed)? {
            self.check_limit(consumed)?;
            stream
                .next_row()
                .map_err(|source| DrainError::Stream { consumed, source })?;
            consumed += 1;
        }
        Ok(consumed)
    }

    fn read_row<S: ResultStream>(
        &self,
        stream: &mut S,
        columns: usize,
        position: usize,
    ) -> Result<Row, DrainError> {
        let accessor = stream.next_row().map_err(|source| DrainError::Stream {
            consumed: position,
            source,
        })?;
        let row = self
            .config
            .row_shape
            .build(columns, &accessor)
            .map_err(|source| DrainError::Access {
                row: position,
                source,
            })?;
        if self.config.log_rows {
            trace!(position, row = %row, "drained row");
        }
        Ok(row)
    }

    fn check_limit(&self, consumed: usize) -> Result<(), DrainError> {
        match self.config.row_limit {
            Some(limit) if consumed >= limit => Err(DrainError::LimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}

fn has_next<S: ResultStream>(stream: &mut S, consumed: usize) -> Result<bool, DrainError> {
    stream
        .has_next()
        .map_err(|source| DrainError::Stream { consumed, source })
}
