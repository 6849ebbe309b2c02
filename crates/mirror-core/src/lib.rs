//! Core types for the odbc-mirror framework.
//!
//! This crate provides the foundational types shared by every part of the
//! mirroring engine:
//!
//! - [`ConnectionSpec`] / [`QuirkProfile`] - Resolved source connections
//! - [`ColumnDef`] / [`MappedColumnDef`] - Source columns and their destination mapping
//! - [`StorageType`] - The closed set of destination storage classes
//! - [`CellValue`] / [`RowBatch`] - Row data flowing from source to destination
//! - [`MirrorError`] - The error taxonomy surfaced to callers
//! - [`SourceConnector`] / [`SourceConnection`] / [`BatchReader`] - The source seam
//!
//! # Architecture
//!
//! ```text
//! mirror-core (this crate)
//!    │
//!    ├─── odbc-types    (maps ODBC column types onto StorageType)
//!    ├─── odbc-source   (implements SourceConnector over odbc-api)
//!    ├─── sqlite-sink   (writes MappedColumnDef / RowBatch into SQLite)
//!    └─── odbc-mirror   (orchestrates a mirror job end to end)
//! ```

pub mod connection;
pub mod error;
pub mod schema;
pub mod source;
pub mod values;

pub use connection::{ConnectionSpec, QuirkProfile};
pub use error::{ErrorKind, MirrorError, SourceError};
pub use schema::{ColumnDef, MappedColumnDef, SourceType, StorageType, TableRef};
pub use source::{BatchReader, SourceConnection, SourceConnector};
pub use values::{CellValue, Row, RowBatch};

/// Default number of rows per batch (and per destination transaction).
pub const DEFAULT_BATCH_SIZE: usize = 1000;
