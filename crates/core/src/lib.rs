//! Core types and traits for Convergent
//!
//! This crate defines the foundational types used throughout the harness:
//! - Value: Unified value enum for every column type an engine returns
//! - Row: Structurally compared result row, plus RowAdapter construction paths
//! - Error: AccessError (column reads) and EngineError (collaborator failures)
//! - Traits: QueryExecutor, ResultStream, RowAccessor, MapStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod row;
pub mod traits;
pub mod value;

pub use error::{AccessError, EngineError};
pub use row::{Row, RowAdapter};
pub use traits::{MapStore, NoStore, QueryExecutor, ResultStream, RowAccessor};
pub use value::Value;
