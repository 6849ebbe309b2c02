use crate::ddl::{quote_ident, SqliteDdl, ToDdl};
use crate::value::SqlCell;
use mirror_core::{MappedColumnDef, RowBatch};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to open destination database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// A column as the destination actually stores it (`PRAGMA table_info`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
}

/// Connection to the destination database, held for one job.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open the destination database file, creating it if it does not exist.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let conn = Connection::open(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SinkError> {
        // Jobs for different tables may write the same file concurrently
        conn.busy_timeout(Duration::from_secs(30))?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self { conn })
    }

    /// Whether a table of this name exists (names compare case-insensitively,
    /// as SQLite resolves them).
    pub fn table_exists(&self, table: &str) -> Result<bool, SinkError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                [table],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Create `table` with `columns` in the given order.
    pub fn create_table(&self, table: &str, columns: &[MappedColumnDef]) -> Result<(), SinkError> {
        let sql = SqliteDdl.to_create_table(table, columns);
        info!("Creating SQLite table with: {}", sql);
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Drop `table` with its contents and create it afresh from `columns`.
    ///
    /// Both steps share one transaction, so a failed create leaves the old
    /// table in place.
    pub fn replace_table(
        &mut self,
        table: &str,
        columns: &[MappedColumnDef],
    ) -> Result<(), SinkError> {
        let create_sql = SqliteDdl.to_create_table(table, columns);
        info!("Replacing SQLite table {} with: {}", table, create_sql);

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
        tx.execute_batch(&create_sql)?;
        tx.commit()?;
        Ok(())
    }

    /// Insert every row of `batch` inside a single transaction.
    ///
    /// On error the transaction is rolled back, leaving no row of the batch
    /// behind; earlier batches are unaffected.
    pub fn insert_batch(
        &mut self,
        table: &str,
        columns: &[MappedColumnDef],
        batch: &RowBatch,
    ) -> Result<usize, SinkError> {
        let insert_sql = SqliteDdl.to_insert(table, columns);

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&insert_sql)?;
            for row in &batch.rows {
                stmt.execute(params_from_iter(row.iter().map(SqlCell)))?;
            }
        }
        tx.commit()?;

        debug!("Committed batch of {} rows into {}", batch.len(), table);
        Ok(batch.len())
    }

    pub fn row_count(&self, table: &str) -> Result<u64, SinkError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Columns of `table` in declared order.
    pub fn columns(&self, table: &str) -> Result<Vec<DestinationColumn>, SinkError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(DestinationColumn {
                    name: row.get("name")?,
                    declared_type: row.get("type")?,
                    not_null: row.get::<_, i64>("notnull")? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}
