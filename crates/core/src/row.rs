//! Comparable result rows
//!
//! A [`Row`] is the value sequence of one result tuple, detached from
//! whatever produced it. Equality and hashing only look at the values, so a
//! row read out of a live stream compares equal to a literal fixture with the
//! same contents.
//!
//! Rows reach the harness from producers that expose their width in
//! different ways. [`RowAdapter`] names each construction path explicitly:
//!
//! | Variant | Column count comes from |
//! |---------|-------------------------|
//! | `FromAccessorAndCount` | the caller (usually stream metadata) |
//! | `FromAccessorSelfDescribing` | [`RowAccessor::column_count`] |
//! | `FromLiteralValues` | the literal itself |

use std::fmt;

use crate::error::AccessError;
use crate::traits::RowAccessor;
use crate::value::Value;

/// One result row, compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Build a row from literal values.
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    /// Pull `column_count` columns out of `accessor`.
    ///
    /// # Errors
    ///
    /// Propagates the first [`AccessError`] raised by the accessor.
    pub fn from_accessor<A>(column_count: usize, accessor: &A) -> Result<Self, AccessError>
    where
        A: RowAccessor + ?Sized,
    {
        let values = (0..column_count)
            .map(|i| accessor.get(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Row { values })
    }

    /// Pull every column out of an accessor that knows its own width.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::UnknownColumnCount`] if the accessor does not
    /// report a column count, otherwise propagates column read failures.
    pub fn from_self_describing<A>(accessor: &A) -> Result<Self, AccessError>
    where
        A: RowAccessor + ?Sized,
    {
        let count = accessor
            .column_count()
            .ok_or(AccessError::UnknownColumnCount)?;
        Self::from_accessor(count, accessor)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a zero-column row
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, if present
    pub fn get(&self, index: usize) -> Option<&Value> {
        <[Value]>::get(&self.values, index)
    }

    /// All values in column order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the row, returning its values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Row{[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        f.write_str("]}")
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

impl<V: Into<Value>> FromIterator<V> for Row {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(Into::into).collect())
    }
}

impl RowAccessor for [Value] {
    fn get(&self, index: usize) -> Result<Value, AccessError> {
        <[Value]>::get(self, index)
            .cloned()
            .ok_or(AccessError::IndexOutOfRange {
                index,
                columns: self.len(),
            })
    }

    fn column_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl RowAccessor for Vec<Value> {
    fn get(&self, index: usize) -> Result<Value, AccessError> {
        RowAccessor::get(self.as_slice(), index)
    }

    fn column_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl RowAccessor for Row {
    fn get(&self, index: usize) -> Result<Value, AccessError> {
        RowAccessor::get(self.values.as_slice(), index)
    }

    fn column_count(&self) -> Option<usize> {
        Some(self.values.len())
    }
}

/// Explicit choice of how to turn a producer's row into a [`Row`].
pub enum RowAdapter<'a> {
    /// Read a fixed number of columns through an accessor
    FromAccessorAndCount {
        /// Columns to read, typically the stream's declared width
        column_count: usize,
        /// Source row
        accessor: &'a dyn RowAccessor,
    },
    /// Read every column of an accessor that reports its own width
    FromAccessorSelfDescribing(&'a dyn RowAccessor),
    /// Use literal values as-is
    FromLiteralValues(Vec<Value>),
}

impl RowAdapter<'_> {
    /// Build the row.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessError`] if an accessor-based variant fails to read
    /// a column or cannot determine its width.
    pub fn into_row(self) -> Result<Row, AccessError> {
        match self {
            RowAdapter::FromAccessorAndCount {
                column_count,
                accessor,
            } => Row::from_accessor(column_count, accessor),
            RowAdapter::FromAccessorSelfDescribing(accessor) => Row::from_self_describing(accessor),
            RowAdapter::FromLiteralValues(values) => Ok(Row::new(values)),
        }
    }
}

impl fmt::Debug for RowAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowAdapter::FromAccessorAndCount { column_count, .. } => f
                .debug_struct("FromAccessorAndCount")
                .field("column_count", column_count)
                .finish_non_exhaustive(),
            RowAdapter::FromAccessorSelfDescribing(_) => {
                f.write_str("FromAccessorSelfDescribing(..)")
            }
            RowAdapter::FromLiteralValues(values) => {
                f.debug_tuple("FromLiteralValues").field(values).finish()
            }
        }
    }
}

/// Build a [`Row`] from literal values.
///
/// ```
/// use convergent_core::{row, Value};
///
/// let r = row![1, "x", ()];
/// assert_eq!(r.get(2), Some(&Value::Null));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new(::std::vec::Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Row::new(::std::vec![$($crate::Value::from($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(r: &Row) -> u64 {
        let mut h = DefaultHasher::new();
        r.hash(&mut h);
        h.finish()
    }

    /// Accessor that hides its width, like rows from engines that keep the
    /// column count on the cursor.
    struct Opaque(Vec<Value>);

    impl RowAccessor for Opaque {
        fn get(&self, index: usize) -> Result<Value, AccessError> {
            RowAccessor::get(self.0.as_slice(), index)
        }
    }

    struct Broken;

    impl RowAccessor for Broken {
        fn get(&self, index: usize) -> Result<Value, AccessError> {
            Err(AccessError::malformed(index, "truncated record"))
        }

        fn column_count(&self) -> Option<usize> {
            Some(2)
        }
    }

    #[test]
    fn test_construction_paths_agree() {
        let literal = row![1, "x"];
        let counted = Row::from_accessor(2, &Opaque(vec![1.into(), "x".into()])).unwrap();
        let described = Row::from_self_describing(&vec![Value::Int(1), "x".into()]).unwrap();

        assert_eq!(literal, counted);
        assert_eq!(literal, described);
        assert_eq!(hash_of(&literal), hash_of(&counted));
        assert_eq!(hash_of(&literal), hash_of(&described));
    }

    #[test]
    fn test_adapter_variants_agree() {
        let source = Opaque(vec![Value::Int(7), Value::Null]);
        let values = vec![Value::Int(7), Value::Null];

        let a = RowAdapter::FromAccessorAndCount {
            column_count: 2,
            accessor: &source,
        }
        .into_row()
        .unwrap();
        let b = RowAdapter::FromAccessorSelfDescribing(&values)
            .into_row()
            .unwrap();
        let c = RowAdapter::FromLiteralValues(values.clone())
            .into_row()
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_self_describing_requires_count() {
        let err = Row::from_self_describing(&Opaque(vec![Value::Int(1)])).unwrap_err();
        assert_eq!(err, AccessError::UnknownColumnCount);
    }

    #[test]
    fn test_count_past_width_is_out_of_range() {
        let err = Row::from_accessor(3, &vec![Value::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            AccessError::IndexOutOfRange {
                index: 1,
                columns: 1
            }
        );
    }

    #[test]
    fn test_malformed_column_propagates() {
        let err = Row::from_self_describing(&Broken).unwrap_err();
        assert!(matches!(err, AccessError::Malformed { index: 0, .. }));
    }

    #[test]
    fn test_null_columns_compare_equal() {
        assert_eq!(row![(), 1], row![(), 1]);
        assert_ne!(row![(), 1], row![0, 1]);
    }

    #[test]
    fn test_column_order_matters() {
        assert_ne!(row![1, 2], row![2, 1]);
    }

    #[test]
    fn test_display() {
        assert_eq!(row![1, "x"].to_string(), "Row{[1, \"x\"]}");
        assert_eq!(row![].to_string(), "Row{[]}");
    }

    #[test]
    fn test_from_iterator() {
        let r: Row = [1i64, 2, 3].into_iter().collect();
        assert_eq!(r.len(), 3);
        assert_eq!(r.get(1), Some(&Value::Int(2)));
    }

    #[test]
    fn test_get_past_width_is_none() {
        let r = row![1, "x"];
        assert_eq!(r.get(0), Some(&Value::Int(1)));
        assert_eq!(r.get(2), None);
        assert_eq!(r.values().len(), 2);
    }
}
