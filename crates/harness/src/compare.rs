//! Multiset comparison of result collections
//!
//! [`SetComparator`] decides equality of two [`ResultCollection`]s as
//! multisets: every value must match exactly, order is ignored, and each row
//! must occur the same number of times on both sides. There is no fuzzy
//! matching and no tie-breaking.
//!
//! For failure messages the comparator produces a [`RowDiff`], the
//! symmetric difference of the two multisets. [`MapDiff`] is the equivalent
//! for named store contents.
//!
//! # Example
//!
//! ```
//! use convergent_core::row;
//! use convergent_harness::{ResultCollection, SetComparator};
//!
//! let expected = ResultCollection::from([row!["a"], row!["a"], row!["b"]]);
//! let actual = ResultCollection::from([row!["b"], row!["a"]]);
//!
//! let diff = SetComparator::diff(&expected, &actual);
//! assert_eq!(diff.missing, vec![(row!["a"], 1)]);
//! assert!(diff.unexpected.is_empty());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};

use convergent_core::{Row, Value};

use crate::collection::ResultCollection;

/// Multiset comparison over [`ResultCollection`]s.
pub struct SetComparator;

impl SetComparator {
    /// True iff both collections hold the same rows with the same multiplicities.
    pub fn equal(expected: &ResultCollection, actual: &ResultCollection) -> bool {
        expected == actual
    }

    /// Symmetric difference of the two multisets.
    ///
    /// Rows are listed in first-seen order, `missing` following `expected`
    /// and `unexpected` following `actual`, so reports are stable.
    pub fn diff(expected: &ResultCollection, actual: &ResultCollection) -> RowDiff {
        let want = expected.multiset();
        let got = actual.multiset();

        RowDiff {
            missing: surplus(expected, &want, &got),
            unexpected: surplus(actual, &got, &want),
        }
    }
}

/// Rows of `side` whose count in `this` exceeds their count in `other`.
fn surplus(
    side: &ResultCollection,
    this: &HashMap<&Row, usize>,
    other: &HashMap<&Row, usize>,
) -> Vec<(Row, usize)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in side {
        if !seen.insert(row) {
            continue;
        }
        let ours = this.get(row).copied().unwrap_or(0);
        let theirs = other.get(row).copied().unwrap_or(0);
        if ours > theirs {
            out.push((row.clone(), ours - theirs));
        }
    }
    out
}

/// Symmetric difference between expected and actual rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowDiff {
    /// Expected rows not matched by actual rows, with the unmatched count
    pub missing: Vec<(Row, usize)>,
    /// Actual rows not matched by expected rows, with the unmatched count
    pub unexpected: Vec<(Row, usize)>,
}

impl RowDiff {
    /// True when the two collections were multiset-equal
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// Render the diff, listing at most `max_rows` entries per side.
    pub fn render(&self, max_rows: usize) -> String {
        let mut out = String::new();
        render_side(&mut out, "missing", &self.missing, max_rows);
        render_side(&mut out, "unexpected", &self.unexpected, max_rows);
        out
    }
}

impl fmt::Display for RowDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(usize::MAX))
    }
}

fn render_side(out: &mut String, label: &str, rows: &[(Row, usize)], max_rows: usize) {
    if rows.is_empty() {
        return;
    }
    let total: usize = rows.iter().map(|(_, n)| n).sum();
    let _ = writeln!(out, "  {} ({}):", label, total);
    for (row, n) in rows.iter().take(max_rows) {
        if *n > 1 {
            let _ = writeln!(out, "    {} x{}", row, n);
        } else {
            let _ = writeln!(out, "    {}", row);
        }
    }
    // Header and trailer both count rows with multiplicity
    let hidden: usize = rows.iter().skip(max_rows).map(|(_, n)| n).sum();
    if hidden > 0 {
        let _ = writeln!(out, "    ... and {} more", hidden);
    }
}

/// A key present on both sides with different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedEntry {
    /// Entry key
    pub key: Value,
    /// Expected value
    pub expected: Value,
    /// Actual value
    pub actual: Value,
}

impl fmt::Display for ChangedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.key, self.expected, self.actual
        )
    }
}

/// Entry-level difference between an expected map and store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapDiff {
    /// Expected entries whose key is absent from the store
    pub missing: Vec<(Value, Value)>,
    /// Store entries whose key was not expected
    pub unexpected: Vec<(Value, Value)>,
    /// Keys present on both sides with different values
    pub changed: Vec<ChangedEntry>,
}

impl MapDiff {
    /// Compare two maps structurally. Entries are sorted by rendered key.
    pub fn between(expected: &HashMap<Value, Value>, actual: &HashMap<Value, Value>) -> Self {
        let mut diff = MapDiff::default();

        for (key, expected_value) in expected {
            match actual.get(key) {
                Some(actual_value) if actual_value == expected_value => {}
                Some(actual_value) => diff.changed.push(ChangedEntry {
                    key: key.clone(),
                    expected: expected_value.clone(),
                    actual: actual_value.clone(),
                }),
                None => diff.missing.push((key.clone(), expected_value.clone())),
            }
        }

        for (key, actual_value) in actual {
            if !expected.contains_key(key) {
                diff.unexpected.push((key.clone(), actual_value.clone()));
            }
        }

        diff.missing.sort_by_cached_key(|(k, _)| k.to_string());
        diff.unexpected.sort_by_cached_key(|(k, _)| k.to_string());
        diff.changed.sort_by_cached_key(|c| c.key.to_string());
        diff
    }

    /// True when the maps were equal
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.changed.is_empty()
    }

    /// Render the diff, listing at most `max_rows` entries per section.
    pub fn render(&self, max_rows: usize) -> String {
        let mut out = String::new();
        render_entries(&mut out, "missing", &self.missing, max_rows);
        render_entries(&mut out, "unexpected", &self.unexpected, max_rows);
        if !self.changed.is_empty() {
            let _ = writeln!(out, "  changed ({}):", self.changed.len());
            for change in self.changed.iter().take(max_rows) {
                let _ = writeln!(out, "    {}", change);
            }
            if self.changed.len() > max_rows {
                let _ = writeln!(out, "    ... and {} more", self.changed.len() - max_rows);
            }
        }
        out
    }
}

impl fmt::Display for MapDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(usize::MAX))
    }
}

fn render_entries(out: &mut String, label: &str, entries: &[(Value, Value)], max_rows: usize) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {} ({}):", label, entries.len());
    for (k, v) in entries.iter().take(max_rows) {
        let _ = writeln!(out, "    {} => {}", k, v);
    }
    if entries.len() > max_rows {
        let _ = writeln!(out, "    ... and {} more", entries.len() - max_rows);
    }
}
