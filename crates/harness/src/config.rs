//! Harness configuration via `convergent.toml`
//!
//! Test suites either build a [`HarnessConfig`] in code or keep a
//! `convergent.toml` next to their fixtures. A missing file can be seeded
//! with the commented defaults from [`HarnessConfig::default_toml`].

use convergent_core::{AccessError, Row, RowAccessor, RowAdapter};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "convergent.toml";

/// Harness configuration loaded from `convergent.toml`.
///
/// # Example
///
/// ```toml
/// # Rows listed per side in a mismatch report
/// max_diff_rows = 20
///
/// # Fail an exhaustive drain after this many rows instead of blocking on an
/// # unbounded stream
/// # row_limit = 100000
///
/// # Emit a trace event for every drained row
/// log_rows = false
///
/// # Where a drained row's width comes from: "declared" or "self_describing"
/// row_shape = "declared"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Rows (or map entries) listed per side in a mismatch report.
    #[serde(default = "default_max_diff_rows")]
    pub max_diff_rows: usize,
    /// Cap on rows read by an exhaustive drain. `None` reads until the
    /// stream ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<usize>,
    /// Emit a `trace` event for every drained row.
    #[serde(default)]
    pub log_rows: bool,
    /// How drained rows are built from the stream's row accessors.
    #[serde(default)]
    pub row_shape: RowShape,
}

/// Construction path for rows read out of a stream.
///
/// Both paths reject rows whose reported width disagrees with what is about
/// to be read, so surplus columns are never dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowShape {
    /// Read the stream's declared column count from every row
    /// ([`RowAdapter::FromAccessorAndCount`]). A row that reports a
    /// different width fails with [`AccessError::WidthMismatch`].
    #[default]
    Declared,
    /// Read as many columns as each row reports
    /// ([`RowAdapter::FromAccessorSelfDescribing`]). A row that does not
    /// report its width fails with [`AccessError::UnknownColumnCount`].
    SelfDescribing,
}

impl RowShape {
    /// Build a row from `accessor` for a stream declaring `columns` columns.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessError`] of the selected construction path.
    pub fn build<A: RowAccessor>(
        self,
        columns: usize,
        accessor: &A,
    ) -> std::result::Result<Row, AccessError> {
        match self {
            RowShape::Declared => {
                if let Some(actual) = accessor.column_count() {
                    if actual != columns {
                        return Err(AccessError::WidthMismatch {
                            declared: columns,
                            actual,
                        });
                    }
                }
                RowAdapter::FromAccessorAndCount {
                    column_count: columns,
                    accessor,
                }
                .into_row()
            }
            RowShape::SelfDescribing => {
                RowAdapter::FromAccessorSelfDescribing(accessor).into_row()
            }
        }
    }
}

fn default_max_diff_rows() -> usize {
    20
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_diff_rows: default_max_diff_rows(),
            row_limit: None,
            log_rows: false,
            row_shape: RowShape::Declared,
        }
    }
}

impl HarnessConfig {
    /// Set the report truncation limit
    pub fn with_max_diff_rows(mut self, max: usize) -> Self {
        self.max_diff_rows = max;
        self
    }

    /// Set the exhaustive-drain cap
    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    /// Enable or disable per-row tracing
    pub fn with_log_rows(mut self, enabled: bool) -> Self {
        self.log_rows = enabled;
        self
    }

    /// Choose how drained rows are built
    pub fn with_row_shape(mut self, shape: RowShape) -> Self {
        self.row_shape = shape;
        self
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `max_diff_rows` or `row_limit` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_diff_rows == 0 {
            return Err(Error::config("max_diff_rows must be at least 1"));
        }
        if self.row_limit == Some(0) {
            return Err(Error::config("row_limit must be at least 1 when set"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Convergent harness configuration
#
# Rows (or map entries) listed per side when an assertion fails.
max_diff_rows = 20

# Fail an exhaustive drain after this many rows instead of blocking forever
# on a stream that never ends. Unset by default.
# row_limit = 100000

# Emit a trace event for every row read from a result stream.
log_rows = false

# How a row's width is found when reading it from a stream:
#   "declared"        - use the stream's column count; rows reporting another
#                       width are rejected
#   "self_describing" - use the width each row reports
row_shape = "declared"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: HarnessConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
