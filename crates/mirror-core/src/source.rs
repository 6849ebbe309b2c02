//! Source-side traits implemented by concrete drivers.
//!
//! The orchestrator only talks to a source through these traits, which lets
//! tests inject an in-memory source in place of a live ODBC driver.

use crate::connection::ConnectionSpec;
use crate::error::SourceError;
use crate::schema::{ColumnDef, MappedColumnDef, TableRef};
use crate::values::RowBatch;

/// Opens connections to a source database.
pub trait SourceConnector: Send + Sync {
    /// Open a connection for one mirror job. The connection is closed when
    /// the returned value is dropped.
    fn connect<'a>(
        &'a self,
        spec: &ConnectionSpec,
    ) -> Result<Box<dyn SourceConnection + 'a>, SourceError>;
}

/// A live source connection, used by exactly one job at a time.
pub trait SourceConnection {
    /// Catalog columns of `table` in ordinal order.
    ///
    /// An empty vector means the catalog knows no such table.
    fn inspect(&mut self, table: &TableRef) -> Result<Vec<ColumnDef>, SourceError>;

    /// Open a forward-only cursor over `table` producing batches of at most
    /// `batch_size` rows, cells shaped for `columns`.
    fn open_batches<'a>(
        &'a mut self,
        table: &TableRef,
        columns: &[MappedColumnDef],
        batch_size: usize,
    ) -> Result<Box<dyn BatchReader + 'a>, SourceError>;
}

/// Lazy, finite, non-restartable sequence of row batches.
///
/// After `next_batch` returns `Ok(None)` the reader stays exhausted; a second
/// pass over the table needs a fresh [`SourceConnection::open_batches`].
pub trait BatchReader {
    fn next_batch(&mut self) -> Result<Option<RowBatch>, SourceError>;
}
