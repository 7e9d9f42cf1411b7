//! Result assertions against a live engine.
//!
//! The [`Harness`] is the entry point test code calls. Each assertion is a
//! single linear pass with no retry:
//!
//! ```text
//! Open ──► Drain ──► Compare ──► Report
//!  │        │
//!  └─ Error::Open   └─ Error::Drain (stream already released)
//! ```
//!
//! | Method | Drain | Detects extra rows |
//! |--------|-------|--------------------|
//! | `assert_rows_any_order` | until end of stream | yes |
//! | `assert_rows_eventually_any_order` | exactly `expected.len()` rows | no |
//! | `assert_map` | read and discard, then read the store | n/a |
//!
//! `assert_rows_eventually_any_order` does not poll. It stops after as many
//! rows as were expected, which lets it run against streams that never end,
//! and blocks until that many rows have arrived.

use std::collections::HashMap;

use convergent_core::{MapStore, NoStore, QueryExecutor, Row, Value};
use tracing::{debug, info, warn};

use crate::collection::ResultCollection;
use crate::compare::{MapDiff, SetComparator};
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::snapshot::{DrainPolicy, Drainer};

/// Assertion runner bound to one engine.
///
/// The harness holds no mutable state: every call opens its own stream, owns
/// it exclusively and releases it before returning.
///
/// # Example
///
/// ```ignore
/// let harness = Harness::new(cluster.sql_service()).with_store(cluster.maps());
///
/// harness.assert_rows_any_order(
///     "SELECT a, b FROM t",
///     [row![1, "x"], row![2, "y"]],
/// )?;
/// ```
#[derive(Debug)]
pub struct Harness<E, S = NoStore> {
    executor: E,
    store: S,
    config: HarnessConfig,
}

impl<E: QueryExecutor> Harness<E, NoStore> {
    /// Create a harness with default configuration and no named store
    pub fn new(executor: E) -> Self {
        Harness {
            executor,
            store: NoStore,
            config: HarnessConfig::default(),
        }
    }
}

impl<E: QueryExecutor, S: MapStore> Harness<E, S> {
    /// Attach the store read by [`assert_map`](Self::assert_map)
    pub fn with_store<T: MapStore>(self, store: T) -> Harness<E, T> {
        Harness {
            executor: self.executor,
            store,
            config: self.config,
        }
    }

    /// Replace the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` fails validation.
    pub fn with_config(mut self, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The engine under test
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The named store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run `sql` and return every row it produces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] or [`Error::Drain`].
    pub fn collect_rows(&self, sql: &str) -> Result<ResultCollection> {
        self.run(sql, DrainPolicy::Exhaustive)
    }

    /// Run `sql` and return its first `n` rows, leaving the rest unread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] or [`Error::Drain`], including when the stream
    /// ends before `n` rows.
    pub fn collect_rows_bounded(&self, sql: &str, n: usize) -> Result<ResultCollection> {
        self.run(sql, DrainPolicy::Bounded(n))
    }

    /// Assert that `sql` produces exactly `expected`, in any order.
    ///
    /// Reads the stream to its end, so extra rows are detected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mismatch`] with the multiset difference, or the
    /// open/drain failure.
    pub fn assert_rows_any_order(
        &self,
        sql: &str,
        expected: impl IntoIterator<Item = Row>,
    ) -> Result<()> {
        let expected: ResultCollection = expected.into_iter().collect();
        let actual = self.collect_rows(sql)?;
        self.verify_rows(sql, &expected, &actual)
    }

    /// Assert that the first `expected.len()` rows of `sql` equal
    /// `expected`, in any order.
    ///
    /// Rows after those are never read, so extra rows go unnoticed and the
    /// stream does not need to end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mismatch`] with the multiset difference, or the
    /// open/drain failure. A stream that ends early fails with
    /// [`DrainError::Exhausted`](crate::DrainError::Exhausted).
    pub fn assert_rows_eventually_any_order(
        &self,
        sql: &str,
        expected: impl IntoIterator<Item = Row>,
    ) -> Result<()> {
        let expected: ResultCollection = expected.into_iter().collect();
        let actual = self.collect_rows_bounded(sql, expected.len())?;
        self.verify_rows(sql, &expected, &actual)
    }

    /// Run `sql` for its side effects, then assert that the store map
    /// `name` holds exactly `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MapMismatch`] with the entry difference,
    /// [`Error::Store`] if the map cannot be read, or the open/drain failure.
    pub fn assert_map<K, V>(
        &self,
        name: &str,
        sql: &str,
        expected: impl IntoIterator<Item = (K, V)>,
    ) -> Result<()>
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let expected: HashMap<Value, Value> = expected
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let stream = self.open(sql)?;
        Drainer::new(&self.config)
            .discard(stream)
            .map_err(|source| Error::Drain {
                sql: sql.to_string(),
                source,
            })?;

        let actual = self.store.get_all(name).map_err(|source| Error::Store {
            name: name.to_string(),
            source,
        })?;

        let diff = MapDiff::between(&expected, &actual);
        if diff.is_empty() {
            info!(name, sql, entries = actual.len(), "map matched");
            return Ok(());
        }

        warn!(
            name,
            sql,
            missing = diff.missing.len(),
            unexpected = diff.unexpected.len(),
            changed = diff.changed.len(),
            "map mismatch"
        );
        let report = diff.render(self.config.max_diff_rows);
        Err(Error::MapMismatch {
            name: name.to_string(),
            sql: sql.to_string(),
            diff,
            report,
        })
    }

    fn open(&self, sql: &str) -> Result<E::Stream> {
        debug!(sql, "executing query");
        self.executor.execute(sql).map_err(|source| Error::Open {
            sql: sql.to_string(),
            source,
        })
    }

    fn run(&self, sql: &str, policy: DrainPolicy) -> Result<ResultCollection> {
        let stream = self.open(sql)?;
        Drainer::new(&self.config)
            .drain(stream, policy)
            .map_err(|source| Error::Drain {
                sql: sql.to_string(),
                source,
            })
    }

    fn verify_rows(
        &self,
        sql: &str,
        expected: &ResultCollection,
        actual: &ResultCollection,
    ) -> Result<()> {
        let diff = SetComparator::diff(expected, actual);
        if diff.is_empty() {
            info!(sql, rows = actual.len(), "rows matched");
            return Ok(());
        }

        warn!(
            sql,
            missing = diff.missing.len(),
            unexpected = diff.unexpected.len(),
            "row mismatch"
        );
        let report = diff.render(self.config.max_diff_rows);
        Err(Error::Mismatch {
            sql: sql.to_string(),
            diff,
            report,
        })
    }
}

/// Turn an assertion result into a test failure.
pub trait AssertionExt {
    /// Panic with the rendered error if the assertion failed.
    fn or_fail(self);
}

impl AssertionExt for Result<()> {
    #[track_caller]
    fn or_fail(self) {
        if let Err(e) = self {
            panic!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DrainError;
    use crate::testing::{MemoryEngine, Script};
    use convergent_core::{row, EngineError};

    const SQL: &str = "SELECT a, b FROM t";

    fn rows(pairs: &[(i64, &str)]) -> Vec<Vec<Value>> {
        pairs
            .iter()
            .map(|(a, b)| vec![Value::Int(*a), Value::from(*b)])
            .collect()
    }

    #[test]
    fn test_any_order_passes_on_reordered_rows() {
        let engine = MemoryEngine::new().with_query(SQL, 2, rows(&[(2, "y"), (1, "x")]));
        let harness = Harness::new(engine);

        harness
            .assert_rows_any_order(SQL, [row![1, "x"], row![2, "y"]])
            .unwrap();
        assert_eq!(harness.executor().last_probe(SQL).unwrap().close_count(), 1);
    }

    #[test]
    fn test_any_order_fails_on_extra_duplicate() {
        let engine = MemoryEngine::new().with_query(SQL, 2, rows(&[(1, "x"), (1, "x")]));
        let harness = Harness::new(engine);

        let err = harness
            .assert_rows_any_order(SQL, [row![1, "x"]])
            .unwrap_err();

        match err {
            Error::Mismatch { sql, diff, report } => {
                assert_eq!(sql, SQL);
                assert_eq!(diff.unexpected, vec![(row![1, "x"], 1)]);
                assert!(report.contains("unexpected (1):"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_eventually_reads_exactly_expected_count() {
        let engine =
            MemoryEngine::new().with_query(SQL, 2, rows(&[(1, "x"), (2, "y"), (3, "z"), (4, "w")]));
        let harness = Harness::new(engine);

        harness
            .assert_rows_eventually_any_order(SQL, [row![2, "y"], row![1, "x"]])
            .unwrap();

        let probe = harness.executor().last_probe(SQL).unwrap();
        assert_eq!(probe.rows_read(), 2);
        assert_eq!(probe.close_count(), 1);
    }

    #[test]
    fn test_eventually_with_no_expected_rows_reads_nothing() {
        let engine = MemoryEngine::new().with_query(SQL, 2, rows(&[(1, "x")]));
        let harness = Harness::new(engine);

        harness
            .assert_rows_eventually_any_order(SQL, Vec::<Row>::new())
            .unwrap();
        assert_eq!(harness.executor().last_probe(SQL).unwrap().rows_read(), 0);
    }

    #[test]
    fn test_failure_after_two_rows_is_drain_error() {
        let engine = MemoryEngine::new()
            .with_query(SQL, 2, rows(&[(1, "x"), (2, "y"), (3, "z")]))
            .with_script(SQL, Script::fail_after(2, EngineError::stream("node left")));
        let harness = Harness::new(engine);

        let err = harness
            .assert_rows_eventually_any_order(SQL, [row![1, "x"], row![2, "y"], row![3, "z"]])
            .unwrap_err();

        assert!(matches!(
            err.as_drain(),
            Some(DrainError::Stream { consumed: 2, .. })
        ));
        assert_eq!(harness.executor().last_probe(SQL).unwrap().close_count(), 1);
    }

    #[test]
    fn test_open_failure_is_wrapped() {
        let engine = MemoryEngine::new().rejecting(SQL, EngineError::query("no table t"));
        let harness = Harness::new(engine);

        let err = harness
            .assert_rows_any_order(SQL, Vec::<Row>::new())
            .unwrap_err();
        assert_eq!(
            err,
            Error::Open {
                sql: SQL.to_string(),
                source: EngineError::query("no table t"),
            }
        );
    }

    #[test]
    fn test_with_config_validates() {
        let harness = Harness::new(MemoryEngine::new());
        let err = harness
            .with_config(HarnessConfig::default().with_max_diff_rows(0))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_report_respects_max_diff_rows() {
        let engine = MemoryEngine::new().with_query(SQL, 2, Vec::new());
        let harness = Harness::new(engine)
            .with_config(HarnessConfig::default().with_max_diff_rows(1))
            .unwrap();

        let err = harness
            .assert_rows_any_order(SQL, [row![1, "x"], row![2, "y"], row![3, "z"]])
            .unwrap_err();
        let Error::Mismatch { diff, report, .. } = err else {
            panic!("expected mismatch");
        };
        assert_eq!(diff.missing.len(), 3);
        assert!(report.contains("... and 2 more"));
    }

    #[test]
    fn test_assert_map_after_side_effect() {
        let sink = "SINK INTO m SELECT a, b FROM t";
        let engine = MemoryEngine::new().with_query(sink, 0, Vec::new()).writing(
            sink,
            "m",
            vec![
                (Value::Int(1), Value::from("x")),
                (Value::Int(2), Value::from("y")),
            ],
        );
        let store = engine.store();
        let harness = Harness::new(engine).with_store(store);

        harness.assert_map("m", sink, [(2, "y"), (1, "x")]).unwrap();
    }

    #[test]
    fn test_assert_map_mismatch() {
        let sink = "SINK INTO m SELECT a, b FROM t";
        let engine = MemoryEngine::new().with_query(sink, 0, Vec::new()).writing(
            sink,
            "m",
            vec![(Value::Int(1), Value::from("x"))],
        );
        let store = engine.store();
        let harness = Harness::new(engine).with_store(store);

        let err = harness.assert_map("m", sink, [(1, "z")]).unwrap_err();
        assert!(err.is_mismatch());
        assert!(err.to_string().contains("expected \"z\", got \"x\""));
    }

    #[test]
    fn test_assert_map_without_store() {
        let sink = "SINK INTO m SELECT 1";
        let harness = Harness::new(MemoryEngine::new().with_query(sink, 0, Vec::new()));

        let err = harness
            .assert_map("m", sink, Vec::<(i64, i64)>::new())
            .unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }

    #[test]
    fn test_or_fail_passes_through_success() {
        let engine = MemoryEngine::new().with_query(SQL, 2, rows(&[(1, "x")]));
        Harness::new(engine)
            .assert_rows_any_order(SQL, [row![1, "x"]])
            .or_fail();
    }

    #[test]
    #[should_panic(expected = "differ from expected")]
    fn test_or_fail_panics_with_report() {
        let engine = MemoryEngine::new().with_query(SQL, 2, rows(&[(1, "x")]));
        Harness::new(engine)
            .assert_rows_any_order(SQL, [row![2, "y"]])
            .or_fail();
    }
}
