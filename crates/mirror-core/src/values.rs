//! Row data carried from a source cursor to the destination.

use crate::schema::StorageType;
use serde::{Deserialize, Serialize};

/// A single cell, already shaped for its destination storage class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Storage class this value will land in, `None` for NULL.
    pub fn storage_type(&self) -> Option<StorageType> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(_) => Some(StorageType::Integer),
            CellValue::Real(_) => Some(StorageType::Real),
            CellValue::Text(_) => Some(StorageType::Text),
            CellValue::Blob(_) => Some(StorageType::Blob),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Real(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(v: Vec<u8>) -> Self {
        CellValue::Blob(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// One source row, cells in source ordinal order.
pub type Row = Vec<CellValue>;

/// A bounded chunk of rows committed to the destination as one transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    pub rows: Vec<Row>,
}

impl RowBatch {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop rows beyond `len`, used when a row cap lands mid-batch.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }
}
