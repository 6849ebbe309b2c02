//! SQLite destination store for odbc-mirror.
//!
//! Owns one connection to the destination database file for the duration of
//! a mirror job. Tables are created from [`MappedColumnDef`]s in source
//! ordinal order and filled one [`RowBatch`] per transaction.
//!
//! [`MappedColumnDef`]: mirror_core::MappedColumnDef
//! [`RowBatch`]: mirror_core::RowBatch

mod ddl;
mod sink;
mod value;

pub use ddl::{quote_ident, SqliteDdl, ToDdl};
pub use sink::{DestinationColumn, SinkError, SqliteSink};
pub use value::SqlCell;
