//! Shared helpers for harness integration tests.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use std::sync::Once;

use convergent_harness::testing::MemoryEngine;
use convergent_harness::{Harness, Value};

static INIT_TRACING: Once = Once::new();

/// Route harness log events to the test writer. Safe to call from every test.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Two-column `(Int, String)` rows.
pub fn int_str_rows(pairs: &[(i64, &str)]) -> Vec<Vec<Value>> {
    pairs
        .iter()
        .map(|(a, b)| vec![Value::Int(*a), Value::from(*b)])
        .collect()
}

/// Harness over an engine that answers `sql` with `rows`.
pub fn harness_for(sql: &str, columns: usize, rows: Vec<Vec<Value>>) -> Harness<MemoryEngine> {
    init_tracing();
    Harness::new(MemoryEngine::new().with_query(sql, columns, rows))
}
