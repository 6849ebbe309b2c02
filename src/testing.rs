//! In-memory source for exercising mirror jobs without an ODBC driver.
//!
//! Tables hold rows as optional text, the way the ODBC reader fetches them,
//! and are converted with the same cell conversion the live source uses.

use mirror_core::{
    BatchReader, ColumnDef, ConnectionSpec, MappedColumnDef, RowBatch, SourceConnection,
    SourceConnector, SourceError, SourceType, StorageType, TableRef,
};
use odbc_types::text_to_cell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A source table: columns in catalog order and text rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTable {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<Option<String>>>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column at the next ordinal position.
    pub fn column(mut self, name: &str, source_type: SourceType, nullable: bool) -> Self {
        let ordinal = self.columns.len() as u32 + 1;
        self.columns
            .push(ColumnDef::new(name, ordinal, source_type, nullable));
        self
    }

    pub fn row<S: AsRef<str>>(mut self, values: &[Option<S>]) -> Self {
        self.rows.push(
            values
                .iter()
                .map(|v| v.as_ref().map(|s| s.as_ref().to_string()))
                .collect(),
        );
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<Option<String>>>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Default)]
struct Failures {
    unreachable: HashSet<String>,
    catalog: HashSet<String>,
    fetch_at: HashMap<String, usize>,
    panic_at: HashMap<String, usize>,
}

/// [`SourceConnector`] over a fixed set of in-memory tables.
///
/// Table names match case-insensitively on their qualified form.
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    tables: HashMap<String, InMemoryTable>,
    failures: Failures,
    batch_delay: Option<Duration>,
    opened: AtomicUsize,
    open_now: AtomicUsize,
    peak_open: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: InMemoryTable) -> Self {
        self.tables.insert(name.to_lowercase(), table);
        self
    }

    /// Connecting with this connection name fails.
    pub fn with_unreachable(mut self, connection: &str) -> Self {
        self.failures.unreachable.insert(connection.to_string());
        self
    }

    /// Catalog queries for this table fail.
    pub fn with_catalog_failure(mut self, table: &str) -> Self {
        self.failures.catalog.insert(table.to_lowercase());
        self
    }

    /// The fetch of batch `index` (0-based) for this table fails.
    pub fn with_fetch_failure(mut self, table: &str, index: usize) -> Self {
        self.failures.fetch_at.insert(table.to_lowercase(), index);
        self
    }

    /// The fetch of batch `index` (0-based) for this table panics.
    pub fn with_fetch_panic(mut self, table: &str, index: usize) -> Self {
        self.failures.panic_at.insert(table.to_lowercase(), index);
        self
    }

    /// Sleep before producing each batch.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = Some(delay);
        self
    }

    /// Connections opened so far.
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.open_now.load(Ordering::SeqCst)
    }

    /// Most connections open at the same time.
    pub fn peak_open_connections(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }

    /// Sizes of every batch produced, across all jobs, in production order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, table: &TableRef) -> Option<&InMemoryTable> {
        self.tables.get(&table.qualified().to_lowercase())
    }
}

impl SourceConnector for InMemoryConnector {
    fn connect<'a>(
        &'a self,
        spec: &ConnectionSpec,
    ) -> Result<Box<dyn SourceConnection + 'a>, SourceError> {
        if self.failures.unreachable.contains(&spec.name) {
            return Err(SourceError::Connection(format!(
                "data source '{}' is unreachable",
                spec.name
            )));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(InMemoryConnection { connector: self }))
    }
}

struct InMemoryConnection<'a> {
    connector: &'a InMemoryConnector,
}

impl Drop for InMemoryConnection<'_> {
    fn drop(&mut self) {
        self.connector.open_now.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SourceConnection for InMemoryConnection<'_> {
    fn inspect(&mut self, table: &TableRef) -> Result<Vec<ColumnDef>, SourceError> {
        let key = table.qualified().to_lowercase();
        if self.connector.failures.catalog.contains(&key) {
            return Err(SourceError::Catalog(format!(
                "permission denied reading catalog for {table}"
            )));
        }
        let mut columns = self
            .connector
            .lookup(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default();
        columns.sort_by_key(|c| c.ordinal);
        Ok(columns)
    }

    fn open_batches<'b>(
        &'b mut self,
        table: &TableRef,
        columns: &[MappedColumnDef],
        batch_size: usize,
    ) -> Result<Box<dyn BatchReader + 'b>, SourceError> {
        let connector = self.connector;
        let source = connector
            .lookup(table)
            .ok_or_else(|| SourceError::Query(format!("no such table: {table}")))?;
        let key = table.qualified().to_lowercase();
        Ok(Box::new(InMemoryReader {
            connector,
            rows: &source.rows,
            storage: columns.iter().map(|c| c.storage).collect(),
            batch_size: batch_size.max(1),
            position: 0,
            batch_index: 0,
            fail_at: connector.failures.fetch_at.get(&key).copied(),
            panic_at: connector.failures.panic_at.get(&key).copied(),
        }))
    }
}

struct InMemoryReader<'a> {
    connector: &'a InMemoryConnector,
    rows: &'a [Vec<Option<String>>],
    storage: Vec<StorageType>,
    batch_size: usize,
    position: usize,
    batch_index: usize,
    fail_at: Option<usize>,
    panic_at: Option<usize>,
}

impl BatchReader for InMemoryReader<'_> {
    fn next_batch(&mut self) -> Result<Option<RowBatch>, SourceError> {
        if self.position >= self.rows.len() {
            return Ok(None);
        }
        if let Some(delay) = self.connector.batch_delay {
            std::thread::sleep(delay);
        }
        if self.panic_at == Some(self.batch_index) {
            panic!("driver crashed while fetching batch {}", self.batch_index);
        }
        if self.fail_at == Some(self.batch_index) {
            return Err(SourceError::Fetch(format!(
                "connection lost while fetching batch {}",
                self.batch_index
            )));
        }

        let end = (self.position + self.batch_size).min(self.rows.len());
        let rows = self.rows[self.position..end]
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.storage)
                    .map(|(cell, storage)| text_to_cell(cell.as_deref(), *storage))
                    .collect()
            })
            .collect();
        self.position = end;
        self.batch_index += 1;

        let batch = RowBatch::new(rows);
        if let Ok(mut sizes) = self.connector.batch_sizes.lock() {
            sizes.push(batch.len());
        }
        Ok(Some(batch))
    }
}

/// `n` rows of `(id, amount, label)` text cells with ids starting at 1.
pub fn numbered_rows(n: usize) -> Vec<Vec<Option<String>>> {
    (1..=n)
        .map(|i| {
            vec![
                Some(i.to_string()),
                Some(format!("{}.50", i)),
                Some(format!("row {i}")),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::QuirkProfile;

    fn spec(name: &str) -> ConnectionSpec {
        ConnectionSpec::new(name, "DSN=test", QuirkProfile::Generic)
    }

    #[test]
    fn test_reader_batches_and_tracks_connections() {
        let connector = InMemoryConnector::new().with_table(
            "t",
            InMemoryTable::new()
                .column("id", SourceType::named("INTEGER"), false)
                .rows((1..=5).map(|i| vec![Some(i.to_string())])),
        );
        let mapped = vec![MappedColumnDef {
            column: ColumnDef::new("id", 1, SourceType::named("INTEGER"), false),
            storage: StorageType::Integer,
        }];

        {
            let mut conn = connector.connect(&spec("a")).unwrap();
            assert_eq!(connector.open_connections(), 1);
            let mut reader = conn.open_batches(&TableRef::parse("T"), &mapped, 2).unwrap();
            let mut sizes = Vec::new();
            while let Some(batch) = reader.next_batch().unwrap() {
                sizes.push(batch.len());
            }
            assert_eq!(sizes, vec![2, 2, 1]);
            assert!(reader.next_batch().unwrap().is_none());
        }
        assert_eq!(connector.open_connections(), 0);
        assert_eq!(connector.connections_opened(), 1);
    }

    #[test]
    fn test_unknown_table_has_no_columns() {
        let connector = InMemoryConnector::new();
        let mut conn = connector.connect(&spec("a")).unwrap();
        assert!(conn.inspect(&TableRef::parse("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_injected_failures() {
        let connector = InMemoryConnector::new()
            .with_table("t", InMemoryTable::new().column("id", SourceType::named("INT"), true))
            .with_unreachable("down")
            .with_catalog_failure("t");
        assert!(connector.connect(&spec("down")).is_err());
        let mut conn = connector.connect(&spec("up")).unwrap();
        assert!(matches!(
            conn.inspect(&TableRef::parse("t")),
            Err(SourceError::Catalog(_))
        ));
    }
}
