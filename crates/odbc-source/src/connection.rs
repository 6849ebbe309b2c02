use crate::inspect::{catalog_columns, describe_columns};
use crate::reader::OdbcBatchReader;
use crate::OdbcOptions;
use mirror_core::{
    BatchReader, ColumnDef, MappedColumnDef, QuirkProfile, SourceConnection, SourceError, TableRef,
};
use odbc_api::Connection;
use tracing::{debug, warn};

/// A live ODBC connection serving one mirror job.
///
/// The underlying handle is disconnected when this value is dropped.
pub struct OdbcConnection<'env> {
    conn: Connection<'env>,
    quirks: QuirkProfile,
    options: OdbcOptions,
}

impl<'env> OdbcConnection<'env> {
    pub fn new(conn: Connection<'env>, quirks: QuirkProfile, options: OdbcOptions) -> Self {
        Self {
            conn,
            quirks,
            options,
        }
    }
}

impl SourceConnection for OdbcConnection<'_> {
    fn inspect(&mut self, table: &TableRef) -> Result<Vec<ColumnDef>, SourceError> {
        let catalog_error = match catalog_columns(&self.conn, table) {
            Ok(columns) if !columns.is_empty() => {
                debug!("Catalog reported {} columns for {}", columns.len(), table);
                return Ok(columns);
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Catalog query for {} failed, trying describe: {}", table, e);
                Some(e)
            }
        };

        // Drivers with partial catalog support (ProvideX among them) still
        // describe a query's result set.
        match describe_columns(&self.conn, table, self.quirks) {
            Ok(columns) => Ok(columns),
            Err(describe_error) => match catalog_error {
                Some(e) => Err(SourceError::Catalog(format!(
                    "{e}; describe fallback also failed: {describe_error}"
                ))),
                // The catalog answered and knows no such table
                None => {
                    debug!("Describe of {} failed: {}", table, describe_error);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn open_batches<'a>(
        &'a mut self,
        table: &TableRef,
        columns: &[MappedColumnDef],
        batch_size: usize,
    ) -> Result<Box<dyn BatchReader + 'a>, SourceError> {
        let sql = format!("SELECT * FROM {}", table.qualified());
        debug!("Executing query: {}", sql);

        let cursor = self
            .conn
            .execute(&sql, ())
            .map_err(|e| SourceError::Query(format!("{e} - SQL: {sql}")))?
            .ok_or_else(|| SourceError::Query(format!("Query produced no result set - SQL: {sql}")))?;

        let reader = OdbcBatchReader::new(
            cursor,
            columns,
            batch_size,
            self.options.max_text_len,
            self.options.rowset_budget,
        )?;
        Ok(Box::new(reader))
    }
}
