//! Forward-only batch reader over an ODBC block cursor.

use crate::text::{row_bytes, text_rows, to_cell, TextRows, UNITS_PER_CHAR};
use mirror_core::{BatchReader, MappedColumnDef, Row, RowBatch, SourceError, StorageType};
use odbc_api::{BlockCursor, Cursor, ResultSetMetadata};
use tracing::debug;

/// Room beyond the declared precision for sign, decimal point and exponent
const NUMERIC_SLACK: usize = 8;
const MIN_COLUMN_WIDTH: usize = 32;

/// Reads a result set in batches of `batch_size` rows.
///
/// The rowset buffer is sized to stay within a memory budget, so one batch
/// may take several fetches. Every batch except the last holds exactly
/// `batch_size` rows.
pub struct OdbcBatchReader<C: Cursor> {
    cursor: BlockCursor<C, TextRows>,
    storage: Vec<StorageType>,
    batch_size: usize,
    pending: Vec<Row>,
    exhausted: bool,
}

impl<C: Cursor + ResultSetMetadata> OdbcBatchReader<C> {
    pub fn new(
        mut cursor: C,
        columns: &[MappedColumnDef],
        batch_size: usize,
        max_text_len: usize,
        rowset_budget: usize,
    ) -> Result<Self, SourceError> {
        let num_cols = cursor
            .num_result_cols()
            .map_err(|e| SourceError::Query(format!("Failed to get column count: {e}")))?
            as usize;
        if num_cols != columns.len() {
            return Err(SourceError::Query(format!(
                "Result set has {num_cols} columns but the inspected schema has {}",
                columns.len()
            )));
        }

        let batch_size = batch_size.max(1);
        let widths: Vec<usize> = columns
            .iter()
            .map(|c| column_width(c, max_text_len))
            .collect();
        let capacity = rowset_capacity(batch_size, row_bytes(&widths), rowset_budget);
        if capacity < batch_size {
            debug!(
                "Fetching {} rows per rowset ({} bytes per row) to fill batches of {}",
                capacity,
                row_bytes(&widths),
                batch_size
            );
        }

        let buffers = text_rows(capacity, &widths)?;
        let cursor = cursor
            .bind_buffer(buffers)
            .map_err(|e| SourceError::Query(format!("Failed to bind buffer: {e}")))?;

        Ok(Self {
            cursor,
            storage: columns.iter().map(|c| c.storage).collect(),
            batch_size,
            pending: Vec::new(),
            exhausted: false,
        })
    }
}

impl<C: Cursor> BatchReader for OdbcBatchReader<C> {
    fn next_batch(&mut self) -> Result<Option<RowBatch>, SourceError> {
        while !self.exhausted && self.pending.len() < self.batch_size {
            // Truncated cells fail the fetch rather than silently losing data
            let fetched = self
                .cursor
                .fetch_with_truncation_check(true)
                .map_err(|e| SourceError::Fetch(e.to_string()))?;

            let Some(buffer) = fetched else {
                self.exhausted = true;
                break;
            };

            for row_idx in 0..buffer.num_rows() {
                let row: Row = self
                    .storage
                    .iter()
                    .enumerate()
                    .map(|(col_idx, storage)| to_cell(buffer.column(col_idx).get(row_idx), *storage))
                    .collect();
                self.pending.push(row);
            }
        }

        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = self.pending.len().min(self.batch_size);
        Ok(Some(RowBatch::new(self.pending.drain(..take).collect())))
    }
}

/// Buffer units reserved per cell of `column`.
///
/// Columns without a declared size get `max_text_len`; longer values fail
/// the fetch.
fn column_width(column: &MappedColumnDef, max_text_len: usize) -> usize {
    let declared = column
        .column
        .source_type
        .size
        .filter(|&size| size > 0)
        .map(|size| size as usize);

    match declared {
        Some(size) => {
            let width = match column.storage {
                // Binary is fetched hex encoded
                StorageType::Blob => size.saturating_mul(2),
                StorageType::Text => size.saturating_mul(UNITS_PER_CHAR),
                StorageType::Integer | StorageType::Real => size.saturating_add(NUMERIC_SLACK),
            };
            width.max(MIN_COLUMN_WIDTH).min(max_text_len)
        }
        None => max_text_len,
    }
}

/// Rows per fetch: `batch_size`, reduced so the rowset stays within `budget`
/// bytes, but never below one row.
fn rowset_capacity(batch_size: usize, row_bytes: usize, budget: usize) -> usize {
    (budget / row_bytes.max(1)).clamp(1, batch_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_MAX_TEXT_LEN, DEFAULT_ROWSET_BUDGET};
    use mirror_core::{ColumnDef, SourceType};

    fn mapped(storage: StorageType, size: Option<u32>) -> MappedColumnDef {
        let mut source_type = SourceType::named("x");
        source_type.size = size;
        MappedColumnDef {
            column: ColumnDef::new("c", 1, source_type, true),
            storage,
        }
    }

    #[test]
    fn test_column_width_follows_declared_size() {
        assert_eq!(
            column_width(&mapped(StorageType::Text, Some(100)), DEFAULT_MAX_TEXT_LEN),
            100 * UNITS_PER_CHAR
        );
        assert_eq!(
            column_width(&mapped(StorageType::Blob, Some(64)), DEFAULT_MAX_TEXT_LEN),
            128
        );
        assert_eq!(
            column_width(&mapped(StorageType::Real, Some(38)), DEFAULT_MAX_TEXT_LEN),
            46
        );
        assert_eq!(
            column_width(&mapped(StorageType::Integer, Some(1)), DEFAULT_MAX_TEXT_LEN),
            MIN_COLUMN_WIDTH
        );
    }

    #[test]
    fn test_unsized_and_huge_columns_use_max_text_len() {
        for size in [None, Some(0), Some(u32::MAX)] {
            assert_eq!(column_width(&mapped(StorageType::Text, size), 4096), 4096);
        }
    }

    #[test]
    fn test_memo_columns_shrink_rowset() {
        let widths = vec![DEFAULT_MAX_TEXT_LEN; 10];
        let capacity = rowset_capacity(1000, row_bytes(&widths), DEFAULT_ROWSET_BUDGET);
        assert!(capacity < 1000);
        assert!(capacity >= 1);
        assert!(capacity * row_bytes(&widths) <= DEFAULT_ROWSET_BUDGET);
    }

    #[test]
    fn test_narrow_columns_keep_full_batch() {
        let widths = vec![40, 40, 12];
        assert_eq!(
            rowset_capacity(1000, row_bytes(&widths), DEFAULT_ROWSET_BUDGET),
            1000
        );
    }

    #[test]
    fn test_rowset_never_empty() {
        assert_eq!(rowset_capacity(1000, usize::MAX, 1024), 1);
        assert_eq!(rowset_capacity(0, 10, 1024), 1);
        assert_eq!(rowset_capacity(1000, 0, 1024), 1000);
    }
}
