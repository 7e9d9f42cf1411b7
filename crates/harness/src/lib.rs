//! # Convergent Harness
//!
//! Assertions that check what a query engine returns, for test suites where
//! rows arrive in no particular order and may only become visible after a
//! delay.
//!
//! - [`Harness`] - entry point: `assert_rows_any_order`,
//!   `assert_rows_eventually_any_order`, `assert_map`
//! - [`ResultCollection`] - unordered row multiset
//! - [`SetComparator`] / [`RowDiff`] / [`MapDiff`] - multiset comparison and
//!   failure reports
//! - [`Drainer`] / [`DrainPolicy`] / [`StreamGuard`] - bounded or exhaustive
//!   stream consumption with guaranteed release
//! - [`HarnessConfig`] / [`RowShape`] - `convergent.toml` settings and row
//!   construction path
//! - [`testing`] - in-memory engine, stream and store doubles
//!
//! ## Quick Start
//!
//! ```text
//! use convergent_harness::{Harness, AssertionExt};
//! use convergent_core::row;
//!
//! let harness = Harness::new(engine).with_store(store);
//!
//! harness
//!     .assert_rows_any_order("SELECT a, b FROM t", [row![1, "x"], row![2, "y"]])
//!     .or_fail();
//!
//! harness
//!     .assert_map("m", "SINK INTO m SELECT a, b FROM t", [(1, "x"), (2, "y")])
//!     .or_fail();
//! ```

#![warn(missing_docs)]

mod assertion;
mod collection;
mod compare;
mod config;
mod error;
mod snapshot;

pub mod testing;

pub use assertion::{AssertionExt, Harness};
pub use collection::ResultCollection;
pub use compare::{ChangedEntry, MapDiff, RowDiff, SetComparator};
pub use config::{HarnessConfig, RowShape, CONFIG_FILE_NAME};
pub use error::{DrainError, Error, Result};
pub use snapshot::{DrainPolicy, Drainer, StreamGuard};

// Re-export core types so test suites only need this crate
pub use convergent_core::{
    row, AccessError, EngineError, MapStore, NoStore, QueryExecutor, ResultStream, Row,
    RowAccessor, RowAdapter, Value,
};
