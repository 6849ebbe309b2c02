//! Fixtures shared by the mirror integration tests.
#![allow(dead_code)]

use mirror_core::{ConnectionSpec, QuirkProfile, SourceType};
use odbc_mirror::testing::{numbered_rows, InMemoryConnector, InMemoryTable};
use odbc_mirror::{ConnectionRegistry, MirrorSettings, TableMirror};
use odbc_types::codes::{SQL_DECIMAL, SQL_INTEGER, SQL_LONGVARCHAR, SQL_VARCHAR};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("odbc_mirror=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

/// `Orders (id INTEGER NOT NULL, total DECIMAL, note TEXT NULL)` with three rows.
pub fn orders_table() -> InMemoryTable {
    InMemoryTable::new()
        .column(
            "id",
            SourceType::named("INTEGER").with_code(SQL_INTEGER),
            false,
        )
        .column(
            "total",
            SourceType::named("DECIMAL")
                .with_code(SQL_DECIMAL)
                .with_size(10)
                .with_scale(2),
            true,
        )
        .column(
            "note",
            SourceType::named("TEXT").with_code(SQL_LONGVARCHAR),
            true,
        )
        .row(&[Some("1"), Some("19.99"), Some("first order")])
        .row(&[Some("2"), Some("1,250.00"), None])
        .row(&[Some("3"), None, Some("2024-03-01 10:30:45")])
}

/// `(id INTEGER NOT NULL, amount DECIMAL, label VARCHAR)` with `n` rows.
pub fn numbered_table(n: usize) -> InMemoryTable {
    InMemoryTable::new()
        .column(
            "id",
            SourceType::named("INTEGER").with_code(SQL_INTEGER),
            false,
        )
        .column(
            "amount",
            SourceType::named("DECIMAL").with_code(SQL_DECIMAL),
            true,
        )
        .column(
            "label",
            SourceType::named("VARCHAR").with_code(SQL_VARCHAR),
            true,
        )
        .rows(numbered_rows(n))
}

/// Registry holding a single generic connection named `erp`.
pub fn single_registry() -> Arc<ConnectionRegistry> {
    Arc::new(
        ConnectionRegistry::new(
            vec![ConnectionSpec::new("erp", "DSN=erp", QuirkProfile::Generic)],
            None,
        )
        .unwrap(),
    )
}

pub fn mirror_for(
    registry: Arc<ConnectionRegistry>,
    connector: Arc<InMemoryConnector>,
    db: &Path,
    batch_size: usize,
) -> TableMirror {
    TableMirror::new(
        registry,
        connector,
        MirrorSettings::new(db).with_batch_size(batch_size),
    )
}

pub fn row_count(db: &Path, table: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(
        &format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\"")),
        [],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn table_exists(db: &Path, table: &str) -> bool {
    let conn = Connection::open(db).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        > 0
}

/// `(name, declared type, not null)` per destination column, in table order.
pub fn columns(db: &Path, table: &str) -> Vec<(String, String, bool)> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\"")))
        .unwrap();
    stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>("name")?,
            row.get::<_, String>("type")?,
            row.get::<_, i64>("notnull")? != 0,
        ))
    })
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap()
}
