//! In-memory collaborators for exercising the harness without a cluster
//!
//! - **MemoryEngine**: query executor answering from registered fixtures,
//!   with failure injection and side-effect writes
//! - **VecStream**: result stream over a fixed row list, observable through a
//!   [`StreamProbe`] after it has been handed off
//! - **MemoryStore**: named maps for side-effect assertions
//!
//! # Example
//!
//! ```
//! use convergent_core::{row, Value};
//! use convergent_harness::testing::MemoryEngine;
//! use convergent_harness::Harness;
//!
//! let sql = "SELECT a, b FROM t";
//! let engine = MemoryEngine::new()
//!     .with_query(sql, 2, vec![
//!         vec![Value::Int(2), "y".into()],
//!         vec![Value::Int(1), "x".into()],
//!     ]);
//!
//! let harness = Harness::new(engine);
//! harness
//!     .assert_rows_any_order(sql, [row![1, "x"], row![2, "y"]])
//!     .unwrap();
//! ```

mod engine;
mod store;
mod stream;

pub use engine::MemoryEngine;
pub use store::MemoryStore;
pub use stream::{FailurePoint, Script, StreamProbe, VecRow, VecStream};
