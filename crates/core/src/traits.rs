//! Collaborator traits for the engine under test
//!
//! The harness never talks to a cluster directly. Whatever starts the cluster
//! hands it implementations of these traits:
//!
//! - [`QueryExecutor`]: turns query text into a [`ResultStream`]
//! - [`ResultStream`]: sequential, single-pass, possibly blocking row source
//! - [`RowAccessor`]: pulls one column of one row by index
//! - [`MapStore`]: reads a named key-value structure in full
//!
//! None of them need to be `Sync`; an assertion runs on the caller's thread.

use std::collections::HashMap;

use crate::error::{AccessError, EngineError};
use crate::value::Value;

/// Column-by-column read access to a single result row.
pub trait RowAccessor {
    /// Read the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessError`] when `index` is out of range or the
    /// column data is malformed.
    fn get(&self, index: usize) -> Result<Value, AccessError>;

    /// Number of columns, if the row knows it.
    ///
    /// Rows produced by some engines only carry their values and rely on the
    /// stream's metadata for the width; those return `None`.
    fn column_count(&self) -> Option<usize> {
        None
    }
}

/// Sequential pull interface over the rows of one executed query.
///
/// `close` must be idempotent and safe to call after partial consumption or
/// after an error.
pub trait ResultStream {
    /// Row handle yielded by [`next_row`](ResultStream::next_row)
    type Row: RowAccessor;

    /// Column count declared by the query's result metadata
    fn column_count(&self) -> usize;

    /// Whether another row is available. May block until the engine
    /// produces one or signals the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the stream failed.
    fn has_next(&mut self) -> Result<bool, EngineError>;

    /// Pull the next row. May block until a row is available.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] when the stream has ended, or another
    /// [`EngineError`] if the engine failed while producing the row.
    fn next_row(&mut self) -> Result<Self::Row, EngineError>;

    /// Release the stream and any server-side resources behind it.
    fn close(&mut self);
}

/// Executes query text against the engine under test.
pub trait QueryExecutor {
    /// Stream type produced by this executor
    type Stream: ResultStream;

    /// Execute `sql` and return its result stream.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] on malformed query text or execution
    /// failure.
    fn execute(&self, sql: &str) -> Result<Self::Stream, EngineError>;
}

/// Named key-value structures whose contents a query may write to.
pub trait MapStore {
    /// Read the full contents of the structure called `name`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the store cannot be read.
    fn get_all(&self, name: &str) -> Result<HashMap<Value, Value>, EngineError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    type Stream = T::Stream;

    fn execute(&self, sql: &str) -> Result<Self::Stream, EngineError> {
        (**self).execute(sql)
    }
}

impl<T: MapStore + ?Sized> MapStore for &T {
    fn get_all(&self, name: &str) -> Result<HashMap<Value, Value>, EngineError> {
        (**self).get_all(name)
    }
}

/// Placeholder store for harnesses that never call `assert_map`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

impl MapStore for NoStore {
    fn get_all(&self, name: &str) -> Result<HashMap<Value, Value>, EngineError> {
        Err(EngineError::store(format!(
            "no store configured; cannot read '{}'",
            name
        )))
    }
}
