//! Scripted in-memory query engine

use std::collections::HashMap;

use convergent_core::{EngineError, QueryExecutor, Value};
use parking_lot::Mutex;

use super::store::MemoryStore;
use super::stream::{Script, StreamProbe, VecRow, VecStream};

#[derive(Debug, Clone, Default)]
struct Fixture {
    columns: usize,
    rows: Vec<VecRow>,
    script: Option<Script>,
    reject: Option<EngineError>,
    writes: Vec<(String, Value, Value)>,
}

/// Query executor answering from registered fixtures.
///
/// Each registered query text maps to a column count and a row list. A query
/// can also be scripted to fail, to be rejected at execution time, or to
/// write entries into the engine's [`MemoryStore`] once its stream has been
/// read to the end.
///
/// ```
/// use convergent_core::Value;
/// use convergent_harness::testing::MemoryEngine;
///
/// let engine = MemoryEngine::new()
///     .with_query("SELECT a FROM t", 1, vec![vec![Value::Int(1)]]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    fixtures: HashMap<String, Fixture>,
    store: MemoryStore,
    probes: Mutex<HashMap<String, Vec<StreamProbe>>>,
}

impl MemoryEngine {
    /// Engine with no queries and an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sql` to return `rows` with `columns` declared columns
    pub fn with_query(self, sql: &str, columns: usize, rows: Vec<Vec<Value>>) -> Self {
        self.with_rows(sql, columns, rows.into_iter().map(VecRow::new).collect())
    }

    /// Register `sql` to return prepared rows
    pub fn with_rows(mut self, sql: &str, columns: usize, rows: Vec<VecRow>) -> Self {
        self.fixtures.insert(
            sql.to_string(),
            Fixture {
                columns,
                rows,
                ..Fixture::default()
            },
        );
        self
    }

    /// Inject a stream failure into a registered query
    pub fn with_script(mut self, sql: &str, script: Script) -> Self {
        self.fixture_mut(sql).script = Some(script);
        self
    }

    /// Make execution of `sql` fail with `error`
    pub fn rejecting(mut self, sql: &str, error: EngineError) -> Self {
        self.fixture_mut(sql).reject = Some(error);
        self
    }

    /// Write `entries` into map `name` once the stream of `sql` reaches its end
    pub fn writing(mut self, sql: &str, name: &str, entries: Vec<(Value, Value)>) -> Self {
        self.store.create(name);
        let fixture = self.fixture_mut(sql);
        fixture
            .writes
            .extend(entries.into_iter().map(|(k, v)| (name.to_string(), k, v)));
        self
    }

    /// Store written by side-effecting queries
    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }

    /// Probe of the most recent stream opened for `sql`
    pub fn last_probe(&self, sql: &str) -> Option<StreamProbe> {
        self.probes.lock().get(sql).and_then(|p| p.last().cloned())
    }

    /// Number of times `sql` has been executed
    pub fn executions(&self, sql: &str) -> usize {
        self.probes.lock().get(sql).map_or(0, Vec::len)
    }

    fn fixture_mut(&mut self, sql: &str) -> &mut Fixture {
        self.fixtures.entry(sql.to_string()).or_default()
    }
}

impl QueryExecutor for MemoryEngine {
    type Stream = VecStream;

    fn execute(&self, sql: &str) -> Result<VecStream, EngineError> {
        let fixture = self
            .fixtures
            .get(sql)
            .ok_or_else(|| EngineError::query(format!("unknown query '{}'", sql)))?;
        if let Some(err) = &fixture.reject {
            return Err(err.clone());
        }

        let mut stream = VecStream::from_rows(fixture.columns, fixture.rows.clone());
        if let Some(script) = &fixture.script {
            stream = stream.with_script(script.clone());
        }
        if !fixture.writes.is_empty() {
            let store = self.store.clone();
            let writes = fixture.writes.clone();
            stream = stream.on_complete(move || {
                for (name, key, value) in writes {
                    store.put(&name, key, value);
                }
            });
        }

        self.probes
            .lock()
            .entry(sql.to_string())
            .or_default()
            .push(stream.probe());
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convergent_core::{MapStore, ResultStream};

    #[test]
    fn test_unknown_query_is_rejected() {
        let engine = MemoryEngine::new();
        let err = engine.execute("SELECT 1").unwrap_err();
        assert!(matches!(err, EngineError::Query { .. }));
        assert_eq!(engine.executions("SELECT 1"), 0);
    }

    #[test]
    fn test_each_execution_gets_fresh_stream() {
        let engine = MemoryEngine::new().with_query("q", 1, vec![vec![Value::Int(1)]]);

        let mut first = engine.execute("q").unwrap();
        first.next_row().unwrap();
        let mut second = engine.execute("q").unwrap();

        assert!(second.has_next().unwrap());
        assert_eq!(engine.executions("q"), 2);
        assert_eq!(engine.last_probe("q").unwrap().rows_read(), 0);
    }

    #[test]
    fn test_rejecting() {
        let engine = MemoryEngine::new().rejecting("bad", EngineError::query("parse error"));
        assert_eq!(
            engine.execute("bad").unwrap_err(),
            EngineError::query("parse error")
        );
    }

    #[test]
    fn test_writes_apply_at_end_of_stream() {
        let engine = MemoryEngine::new()
            .with_query("sink", 0, vec![vec![], vec![]])
            .writing("sink", "m", vec![(Value::Int(1), Value::from("a"))]);
        let store = engine.store();

        let mut stream = engine.execute("sink").unwrap();
        assert!(store.get_all("m").unwrap().is_empty());

        while stream.has_next().unwrap() {
            stream.next_row().unwrap();
        }
        assert_eq!(store.get_all("m").unwrap().len(), 1);
    }
}
