//! Error types for row access and engine collaborators
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Type | Raised by |
//! |------|-----------|
//! | [`AccessError`] | A [`RowAccessor`](crate::RowAccessor) column read |
//! | [`EngineError`] | The query executor, result stream or named store |

use thiserror::Error;

/// Failure reading a column out of a result row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Column index past the end of the row
    #[error("column index {index} out of range for row with {columns} columns")]
    IndexOutOfRange {
        /// Requested column
        index: usize,
        /// Columns the row actually has
        columns: usize,
    },

    /// The underlying column data could not be decoded
    #[error("malformed column {index}: {reason}")]
    Malformed {
        /// Column that failed to decode
        index: usize,
        /// Decoder message
        reason: String,
    },

    /// Self-describing construction was requested from a row that does not
    /// expose its column count
    #[error("row does not report its column count")]
    UnknownColumnCount,

    /// Row reports a different width than its stream declared
    #[error("row has {actual} columns but the stream declares {declared}")]
    WidthMismatch {
        /// Width from stream metadata
        declared: usize,
        /// Width reported by the row
        actual: usize,
    },
}

impl AccessError {
    /// Create a malformed-column error
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        AccessError::Malformed {
            index,
            reason: reason.into(),
        }
    }
}

/// Error reported by an external engine collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Query text rejected or execution failed
    #[error("query failed: {reason}")]
    Query {
        /// Engine message
        reason: String,
    },

    /// Result stream failed while producing rows
    #[error("stream failed: {reason}")]
    Stream {
        /// Engine message
        reason: String,
    },

    /// Named store could not be read
    #[error("store failed: {reason}")]
    Store {
        /// Engine message
        reason: String,
    },

    /// Pull attempted on a stream that was already closed or exhausted
    #[error("stream closed")]
    Closed,
}

impl EngineError {
    /// Create a query error
    pub fn query(reason: impl Into<String>) -> Self {
        EngineError::Query {
            reason: reason.into(),
        }
    }

    /// Create a stream error
    pub fn stream(reason: impl Into<String>) -> Self {
        EngineError::Stream {
            reason: reason.into(),
        }
    }

    /// Create a store error
    pub fn store(reason: impl Into<String>) -> Self {
        EngineError::Store {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_display_out_of_range() {
        let err = AccessError::IndexOutOfRange {
            index: 3,
            columns: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("3"));
        assert!(msg.contains("2 columns"));
    }

    #[test]
    fn test_access_error_display_malformed() {
        let err = AccessError::malformed(1, "bad utf-8");
        assert_eq!(err.to_string(), "malformed column 1: bad utf-8");
    }

    #[test]
    fn test_access_error_display_width_mismatch() {
        let err = AccessError::WidthMismatch {
            declared: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "row has 3 columns but the stream declares 2"
        );
    }

    #[test]
    fn test_engine_error_display() {
        assert_eq!(
            EngineError::query("syntax error").to_string(),
            "query failed: syntax error"
        );
        assert_eq!(
            EngineError::stream("member left").to_string(),
            "stream failed: member left"
        );
        assert_eq!(EngineError::store("no map").to_string(), "store failed: no map");
        assert_eq!(EngineError::Closed.to_string(), "stream closed");
    }
}
