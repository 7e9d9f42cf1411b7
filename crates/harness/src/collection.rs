//! Unordered row multisets.

use std::collections::HashMap;
use std::fmt;

use convergent_core::Row;

/// An unordered multiset of rows.
///
/// Used both for expected fixtures and for rows drained from a live query.
/// Insertion order is kept only for display; equality ignores it and counts
/// duplicates.
#[derive(Debug, Clone, Default)]
pub struct ResultCollection {
    rows: Vec<Row>,
}

impl ResultCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection with room for `capacity` rows
    pub fn with_capacity(capacity: usize) -> Self {
        ResultCollection {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Add one occurrence of `row`
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Total occurrences, duplicates included
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no rows were added
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterate rows in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Occurrences of `row`
    pub fn count(&self, row: &Row) -> usize {
        self.rows.iter().filter(|r| *r == row).count()
    }

    /// Canonical multiset form: distinct row to occurrence count
    pub fn multiset(&self) -> HashMap<&Row, usize> {
        let mut counts = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            *counts.entry(row).or_insert(0) += 1;
        }
        counts
    }
}

impl PartialEq for ResultCollection {
    fn eq(&self, other: &Self) -> bool {
        self.rows.len() == other.rows.len() && self.multiset() == other.multiset()
    }
}

impl Eq for ResultCollection {}

impl From<Vec<Row>> for ResultCollection {
    fn from(rows: Vec<Row>) -> Self {
        ResultCollection { rows }
    }
}

impl<const N: usize> From<[Row; N]> for ResultCollection {
    fn from(rows: [Row; N]) -> Self {
        ResultCollection {
            rows: rows.into_iter().collect(),
        }
    }
}

impl FromIterator<Row> for ResultCollection {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        ResultCollection {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<Row> for ResultCollection {
    fn extend<I: IntoIterator<Item = Row>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl IntoIterator for ResultCollection {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultCollection {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for ResultCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", row)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convergent_core::row;

    #[test]
    fn test_order_is_ignored() {
        let a = ResultCollection::from([row![1, "x"], row![2, "y"]]);
        let b = ResultCollection::from([row![2, "y"], row![1, "x"]]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let c = ResultCollection::from([row![1], row![1], row![2]]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.count(&row![1]), 2);
        assert_eq!(c.multiset().len(), 2);
    }

    #[test]
    fn test_multiplicity_matters() {
        let a = ResultCollection::from([row!["a"], row!["a"], row!["b"]]);
        let b = ResultCollection::from([row!["a"], row!["b"]]);
        assert_ne!(a, b);

        let c = ResultCollection::from([row!["a"], row!["b"], row!["b"]]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_equals_empty() {
        assert_eq!(ResultCollection::new(), ResultCollection::from(vec![]));
    }

    #[test]
    fn test_display() {
        let c = ResultCollection::from([row![1], row![()]]);
        assert_eq!(c.to_string(), "[Row{[1]}, Row{[null]}]");
    }
}
