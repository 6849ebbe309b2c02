//! Source column definitions and their destination mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A possibly schema-qualified source table name.
///
/// `"dbo.Orders"` splits into schema `dbo` and table `Orders`; a bare name has
/// no schema. Only the first dot separates, so `"a.b.c"` keeps `"b.c"` as the
/// table part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
}

impl TableRef {
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((schema, table)) if !schema.is_empty() && !table.is_empty() => Self {
                schema: Some(schema.to_string()),
                table: table.to_string(),
            },
            _ => Self {
                schema: None,
                table: name.to_string(),
            },
        }
    }

    /// The name as written in a `FROM` clause.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table),
            None => self.table.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Driver-reported type of a source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceType {
    /// ODBC SQL data type code (`DATA_TYPE` in the catalog), if reported
    pub code: Option<i16>,
    /// Driver-specific declared type name (`TYPE_NAME` in the catalog)
    pub name: String,
    /// Column size / precision
    pub size: Option<u32>,
    /// Decimal digits / scale
    pub scale: Option<i16>,
}

impl SourceType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            code: None,
            name: name.into(),
            size: None,
            scale: None,
        }
    }

    pub fn with_code(mut self, code: i16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_scale(mut self, scale: i16) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// One column of a source table, as reported by its catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// 1-based position; source order is authoritative
    pub ordinal: u32,
    pub source_type: SourceType,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ordinal: u32, source_type: SourceType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ordinal,
            source_type,
            nullable,
        }
    }
}

/// Destination storage class.
///
/// The destination store only distinguishes these classes; anything the
/// mapper cannot place is stored as `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    Integer,
    Real,
    Text,
    Blob,
}

impl StorageType {
    /// Column type keyword used in `CREATE TABLE`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            StorageType::Integer => "INTEGER",
            StorageType::Real => "REAL",
            StorageType::Text => "TEXT",
            StorageType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A source column paired with its destination storage class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumnDef {
    pub column: ColumnDef,
    pub storage: StorageType,
}

impl MappedColumnDef {
    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn nullable(&self) -> bool {
        self.column.nullable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_bare_name() {
        let t = TableRef::parse("Orders");
        assert_eq!(t.schema, None);
        assert_eq!(t.table, "Orders");
        assert_eq!(t.qualified(), "Orders");
    }

    #[test]
    fn test_table_ref_qualified_name() {
        let t = TableRef::parse("dbo.Orders");
        assert_eq!(t.schema.as_deref(), Some("dbo"));
        assert_eq!(t.table, "Orders");
        assert_eq!(t.to_string(), "dbo.Orders");
    }

    #[test]
    fn test_table_ref_degenerate_dots() {
        assert_eq!(TableRef::parse(".Orders").table, ".Orders");
        assert_eq!(TableRef::parse("dbo.").schema, None);
        assert_eq!(TableRef::parse("a.b.c").table, "b.c");
    }

    #[test]
    fn test_storage_type_serializes_uppercase() {
        let json = serde_json::to_string(&StorageType::Blob).unwrap();
        assert_eq!(json, "\"BLOB\"");
    }
}
