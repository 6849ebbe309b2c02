use mirror_core::CellValue;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

/// Binds a [`CellValue`] as a SQLite parameter without copying it.
pub struct SqlCell<'a>(pub &'a CellValue);

impl ToSql for SqlCell<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            CellValue::Null => ValueRef::Null,
            CellValue::Integer(v) => ValueRef::Integer(*v),
            CellValue::Real(v) => ValueRef::Real(*v),
            CellValue::Text(s) => ValueRef::Text(s.as_bytes()),
            CellValue::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}
