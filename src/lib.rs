//! OdbcMirror Library
//!
//! A library for mirroring a single table from an ODBC data source into a
//! local SQLite database, so the copy can be queried without a live source
//! connection.
//!
//! # Features
//!
//! - Schema introspection: catalog columns in ordinal order, with a describe fallback
//! - Type mapping: ODBC types onto SQLite storage classes, with driver quirk profiles
//! - Overwrite policy: create, fail with `TableExists`, or drop and recreate
//! - Batched transfer: forward-only reads, one destination transaction per batch
//! - Partial-failure reporting: committed row count travels with every error
//!
//! # Components
//!
//! - [`registry::ConnectionRegistry`] - named connections and the default
//! - [`mirror::TableMirror`] - the mirror job orchestrator
//! - [`tools`] - the `mirror-table` and `list-odbc-connections` capabilities
//!
//! # CLI Usage
//!
//! ```bash
//! # Mirror a table using the default connection
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db \
//!   mirror-table --source-table Orders
//!
//! # Replace an existing copy under a different name
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db \
//!   mirror-table --source-table AR_Customer --dest-table customers \
//!   --connection-name sage100 --overwrite
//!
//! # List configured connections
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db list-odbc-connections
//! ```

use clap::Parser;
use std::path::PathBuf;

pub mod config;
pub mod locks;
pub mod mirror;
pub mod registry;
pub mod testing;
pub mod tools;

pub use mirror::{MirrorRequest, MirrorResult, MirrorSettings, MirrorStatus, TableMirror};
pub use registry::ConnectionRegistry;

#[derive(Parser, Clone, Debug)]
pub struct MirrorOpts {
    /// Path to the ODBC connections configuration file (TOML)
    #[arg(long, env = "MIRROR_ODBC_CONFIG")]
    pub odbc_config: PathBuf,

    /// Path to the SQLite database receiving mirrored tables
    #[arg(long, env = "MIRROR_SQLITE_DB")]
    pub sqlite_db: PathBuf,

    /// Rows per batch (and per destination transaction)
    #[arg(long, default_value_t = mirror_core::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Stop after this many rows (default: copy the whole table)
    #[arg(long)]
    pub max_rows: Option<u64>,

    /// Largest text cell, in bytes, read from the source
    #[arg(long, default_value_t = odbc_source::DEFAULT_MAX_TEXT_LEN)]
    pub max_text_len: usize,

    /// Memory budget, in bytes, for the source fetch buffer
    #[arg(long, default_value_t = odbc_source::DEFAULT_ROWSET_BUDGET)]
    pub rowset_budget: usize,
}

impl From<&MirrorOpts> for MirrorSettings {
    fn from(opts: &MirrorOpts) -> Self {
        MirrorSettings {
            sqlite_path: opts.sqlite_db.clone(),
            batch_size: opts.batch_size,
            max_rows: opts.max_rows,
        }
    }
}

impl From<&MirrorOpts> for odbc_source::OdbcOptions {
    fn from(opts: &MirrorOpts) -> Self {
        odbc_source::OdbcOptions {
            max_text_len: opts.max_text_len,
            rowset_budget: opts.rowset_budget,
        }
    }
}
