//! Convergent - order-insensitive result assertions for query engine tests
//!
//! Convergent checks what a query returns without caring about row order.
//! It drains a result stream either to its end or for a fixed number of
//! rows, always releases the stream, and reports the multiset difference
//! when expected and actual rows disagree.
//!
//! # Quick Start
//!
//! ```ignore
//! use convergent::{row, AssertionExt, Harness};
//!
//! let harness = Harness::new(engine).with_store(maps);
//!
//! // Exhaustive: extra rows fail the assertion
//! harness
//!     .assert_rows_any_order("SELECT a, b FROM t", [row![1, "x"], row![2, "y"]])
//!     .or_fail();
//!
//! // Bounded: reads two rows, works on streams that never end
//! harness
//!     .assert_rows_eventually_any_order("SELECT * FROM TABLE(gen())", [row![0], row![1]])
//!     .or_fail();
//! ```
//!
//! # Architecture
//!
//! Engine-facing types ([`Value`], [`Row`], [`QueryExecutor`]) live in
//! `convergent-core`. Draining, comparison and assertions live in
//! `convergent-harness`. Both are re-exported here.

pub use convergent_harness::*;
