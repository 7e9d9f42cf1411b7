//! Scripted in-memory result streams

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use convergent_core::{AccessError, EngineError, ResultStream, RowAccessor, Value};

/// Where a scripted failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// `has_next` returns the error
    HasNext,
    /// `next_row` returns the error
    NextRow,
}

/// Failure injection for a [`VecStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Rows delivered before the failure
    pub after: usize,
    /// Which call fails
    pub point: FailurePoint,
    /// Error returned
    pub error: EngineError,
}

impl Script {
    /// Fail the `has_next` call that follows the `after`-th row
    pub fn fail_after(after: usize, error: EngineError) -> Self {
        Script {
            after,
            point: FailurePoint::HasNext,
            error,
        }
    }

    /// Report a row as available but fail to deliver it
    pub fn fail_on_next_row(after: usize, error: EngineError) -> Self {
        Script {
            after,
            point: FailurePoint::NextRow,
            error,
        }
    }
}

/// Shared counters observing a [`VecStream`] after it has been moved away.
#[derive(Debug, Clone, Default)]
pub struct StreamProbe {
    rows_read: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl StreamProbe {
    /// Rows handed out by `next_row`
    pub fn rows_read(&self) -> usize {
        self.rows_read.load(Ordering::SeqCst)
    }

    /// Calls to `close`
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// One row of a [`VecStream`].
///
/// Reports its own width unless built with [`VecRow::with_hidden_width`],
/// which mimics engines whose rows rely on stream metadata.
#[derive(Debug, Clone)]
pub struct VecRow {
    values: Vec<Value>,
    malformed: Option<usize>,
    hidden_width: bool,
}

impl VecRow {
    /// Row with the given values
    pub fn new(values: Vec<Value>) -> Self {
        VecRow {
            values,
            malformed: None,
            hidden_width: false,
        }
    }

    /// Make reads of column `index` fail as malformed
    pub fn with_malformed_column(mut self, index: usize) -> Self {
        self.malformed = Some(index);
        self
    }

    /// Stop reporting the column count
    pub fn with_hidden_width(mut self) -> Self {
        self.hidden_width = true;
        self
    }
}

impl RowAccessor for VecRow {
    fn get(&self, index: usize) -> Result<Value, AccessError> {
        if self.malformed == Some(index) {
            return Err(AccessError::malformed(index, "undecodable column"));
        }
        RowAccessor::get(self.values.as_slice(), index)
    }

    fn column_count(&self) -> Option<usize> {
        if self.hidden_width {
            None
        } else {
            Some(self.values.len())
        }
    }
}

/// Result stream over a fixed list of rows.
pub struct VecStream {
    columns: usize,
    rows: std::vec::IntoIter<VecRow>,
    delivered: usize,
    script: Option<Script>,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
    closed: bool,
    probe: StreamProbe,
}

impl VecStream {
    /// Stream of `rows`, declaring `columns` columns
    pub fn new(columns: usize, rows: Vec<Vec<Value>>) -> Self {
        Self::from_rows(columns, rows.into_iter().map(VecRow::new).collect())
    }

    /// Stream of prepared rows
    pub fn from_rows(columns: usize, rows: Vec<VecRow>) -> Self {
        VecStream {
            columns,
            rows: rows.into_iter(),
            delivered: 0,
            script: None,
            on_complete: None,
            closed: false,
            probe: StreamProbe::default(),
        }
    }

    /// Inject a failure
    pub fn with_script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    /// Run `f` once when the stream first reports its end
    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Counters that stay readable after the stream is consumed
    pub fn probe(&self) -> StreamProbe {
        self.probe.clone()
    }

    fn scripted(&self, point: FailurePoint) -> Option<EngineError> {
        self.script
            .as_ref()
            .filter(|s| s.point == point && s.after == self.delivered)
            .map(|s| s.error.clone())
    }
}

impl fmt::Debug for VecStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecStream")
            .field("columns", &self.columns)
            .field("remaining", &self.rows.as_slice().len())
            .field("delivered", &self.delivered)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ResultStream for VecStream {
    type Row = VecRow;

    fn column_count(&self) -> usize {
        self.columns
    }

    fn has_next(&mut self) -> Result<bool, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        if let Some(err) = self.scripted(FailurePoint::HasNext) {
            return Err(err);
        }
        if self.scripted(FailurePoint::NextRow).is_some() {
            return Ok(true);
        }
        let more = !self.rows.as_slice().is_empty();
        if !more {
            if let Some(f) = self.on_complete.take() {
                f();
            }
        }
        Ok(more)
    }

    fn next_row(&mut self) -> Result<VecRow, EngineError> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        if let Some(err) = self.scripted(FailurePoint::NextRow) {
            return Err(err);
        }
        let row = self.rows.next().ok_or(EngineError::Closed)?;
        self.delivered += 1;
        self.probe.rows_read.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    }

    fn close(&mut self) {
        self.closed = true;
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_then_end() {
        let mut stream = VecStream::new(1, vec![vec![Value::Int(1)]]);
        assert!(stream.has_next().unwrap());
        assert_eq!(stream.next_row().unwrap().get(0).unwrap(), Value::Int(1));
        assert!(!stream.has_next().unwrap());
        assert_eq!(stream.next_row().unwrap_err(), EngineError::Closed);
    }

    #[test]
    fn test_closed_stream_refuses_reads() {
        let mut stream = VecStream::new(1, vec![vec![Value::Int(1)]]);
        stream.close();
        assert_eq!(stream.has_next().unwrap_err(), EngineError::Closed);
    }

    #[test]
    fn test_fail_on_next_row() {
        let mut stream = VecStream::new(1, vec![vec![Value::Int(1)], vec![Value::Int(2)]])
            .with_script(Script::fail_on_next_row(1, EngineError::stream("boom")));
        stream.next_row().unwrap();
        assert!(stream.has_next().unwrap());
        assert_eq!(stream.next_row().unwrap_err(), EngineError::stream("boom"));
    }

    #[test]
    fn test_on_complete_runs_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut stream = VecStream::new(1, vec![]).on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!stream.has_next().unwrap());
        assert!(!stream.has_next().unwrap());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_column() {
        let row = VecRow::new(vec![Value::Int(1), Value::Int(2)]).with_malformed_column(1);
        assert!(row.get(0).is_ok());
        assert!(matches!(row.get(1), Err(AccessError::Malformed { index: 1, .. })));
        assert_eq!(row.column_count(), Some(2));
        assert_eq!(row.with_hidden_width().column_count(), None);
    }

    #[test]
    fn test_debug_shows_progress() {
        let mut stream = VecStream::new(2, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        stream.next_row().unwrap();
        let rendered = format!("{:?}", stream);
        assert!(rendered.starts_with("VecStream {"));
        assert!(rendered.contains("remaining: 1"));
        assert!(rendered.contains("delivered: 1"));
    }
}
