//! Error types for harness assertions.
//!
//! All failures of an assertion are represented by the [`Error`] enum.
//! Engine failures are wrapped, never swallowed, and every variant carries
//! enough context (query text, diff) to debug a failure without re-running.
//!
//! # Categories
//!
//! | Category | Variants | Description |
//! |----------|----------|-------------|
//! | Engine | `Open`, `Drain`, `Store` | The engine under test failed |
//! | Assertion | `Mismatch`, `MapMismatch` | Expected and actual differ |
//! | Setup | `Config` | Harness configuration is invalid |

use convergent_core::{AccessError, EngineError};
use thiserror::Error;

use crate::compare::{MapDiff, RowDiff};

/// Failure while consuming a result stream.
///
/// By the time a `DrainError` reaches the caller the stream has already been
/// released.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrainError {
    /// A row could not be converted
    #[error("row {row}: {source}")]
    Access {
        /// Zero-based position of the row in the stream
        row: usize,
        /// Column read failure
        #[source]
        source: AccessError,
    },

    /// The stream itself failed
    #[error("stream failed after {consumed} rows: {source}")]
    Stream {
        /// Rows successfully converted before the failure
        consumed: usize,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// A bounded drain hit the end of the stream early
    #[error("stream ended after {consumed} of {expected} rows")]
    Exhausted {
        /// Rows read
        consumed: usize,
        /// Rows required
        expected: usize,
    },

    /// An exhaustive drain read more rows than the configured cap
    #[error("stream produced more than {limit} rows")]
    LimitExceeded {
        /// Configured `row_limit`
        limit: usize,
    },
}

/// Assertion failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The executor rejected the query
    #[error("failed to execute '{sql}': {source}")]
    Open {
        /// Query text
        sql: String,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// Draining the query's stream failed
    #[error("failed to drain '{sql}': {source}")]
    Drain {
        /// Query text
        sql: String,
        /// Drain failure
        #[source]
        source: DrainError,
    },

    /// Actual rows differ from expected rows
    #[error("rows of '{sql}' differ from expected:\n{report}")]
    Mismatch {
        /// Query text
        sql: String,
        /// Full multiset difference
        diff: RowDiff,
        /// Rendered (possibly truncated) diff
        report: String,
    },

    /// The named store could not be read
    #[error("failed to read store '{name}': {source}")]
    Store {
        /// Store name
        name: String,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// Store contents differ from the expected map after running the query
    #[error("store '{name}' after '{sql}' differs from expected:\n{report}")]
    MapMismatch {
        /// Store name
        name: String,
        /// Query text
        sql: String,
        /// Full entry difference
        diff: MapDiff,
        /// Rendered (possibly truncated) diff
        report: String,
    },

    /// Invalid harness configuration
    #[error("invalid config: {reason}")]
    Config {
        /// What is wrong
        reason: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// The drain failure, if this error wraps one
    pub fn as_drain(&self) -> Option<&DrainError> {
        match self {
            Error::Drain { source, .. } => Some(source),
            _ => None,
        }
    }

    /// True for `Mismatch` and `MapMismatch`
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::Mismatch { .. } | Error::MapMismatch { .. })
    }
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, Error>;
