//! Source column type to destination storage class mapping.
//!
//! Mapping is a pure function of `(SourceType, QuirkProfile)` and is total:
//! anything unrecognised becomes `TEXT`.
//!
//! Resolution order:
//!
//! | Profile    | 1st                     | 2nd                | 3rd                | fallback |
//! |------------|-------------------------|--------------------|--------------------|----------|
//! | `Generic`  | -                       | type code          | declared type name | `TEXT`   |
//! | `ProvideX` | ProvideX override table | -                  | declared type name | `TEXT`   |
//!
//! ProvideX reports type codes inconsistently across otherwise identical
//! columns, so its codes are never consulted.

use crate::codes::*;
use mirror_core::{ColumnDef, MappedColumnDef, QuirkProfile, SourceType, StorageType};

/// Overrides for the ProvideX (Sage 100) driver, keyed by normalised type name.
const PROVIDEX_OVERRIDES: &[(&str, StorageType)] = &[
    ("LCHAR", StorageType::Text),
    ("LVARCHAR", StorageType::Text),
    ("LONGVARCHAR", StorageType::Text),
    ("CHAR", StorageType::Text),
    ("VARCHAR", StorageType::Text),
    ("NUMERIC", StorageType::Real),
    ("DECIMAL", StorageType::Real),
    ("DOUBLE", StorageType::Real),
    ("INTEGER", StorageType::Integer),
    ("BIT", StorageType::Integer),
    ("DATE", StorageType::Text),
    ("TIME", StorageType::Text),
    ("TIMESTAMP", StorageType::Text),
];

/// Maps source column types for one quirk profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapper {
    quirks: QuirkProfile,
}

impl TypeMapper {
    pub fn new(quirks: QuirkProfile) -> Self {
        Self { quirks }
    }

    pub fn quirks(&self) -> QuirkProfile {
        self.quirks
    }

    /// Pair a column with its storage class. Name, ordinal and nullability are
    /// carried through untouched.
    pub fn map_column(&self, column: &ColumnDef) -> MappedColumnDef {
        MappedColumnDef {
            column: column.clone(),
            storage: self.map_type(&column.source_type),
        }
    }

    /// Map every column, preserving order and count.
    pub fn map_columns(&self, columns: &[ColumnDef]) -> Vec<MappedColumnDef> {
        columns.iter().map(|c| self.map_column(c)).collect()
    }

    pub fn map_type(&self, source_type: &SourceType) -> StorageType {
        let name = normalize_type_name(&source_type.name);

        match self.quirks {
            QuirkProfile::ProvideX => providex_override(&name)
                .or_else(|| storage_for_name(&name))
                .unwrap_or(StorageType::Text),
            QuirkProfile::Generic => source_type
                .code
                .and_then(storage_for_code)
                .or_else(|| storage_for_name(&name))
                .unwrap_or(StorageType::Text),
        }
    }
}

fn providex_override(name: &str) -> Option<StorageType> {
    PROVIDEX_OVERRIDES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, storage)| *storage)
}

/// Normalise a driver type name for lookup.
///
/// Uppercases, drops any parenthesised length/precision, drops `UNSIGNED`,
/// `SIGNED`, `IDENTITY` and `ZEROFILL` qualifiers and collapses whitespace:
/// `"int identity"` becomes `"INT"`, `"varchar(255)"` becomes `"VARCHAR"`.
pub fn normalize_type_name(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    let without_parens = match (upper.find('('), upper.rfind(')')) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}", &upper[..start], &upper[end + 1..])
        }
        _ => upper,
    };

    without_parens
        .split_whitespace()
        .filter(|word| !matches!(*word, "UNSIGNED" | "SIGNED" | "IDENTITY" | "ZEROFILL"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn storage_for_code(code: i16) -> Option<StorageType> {
    match code {
        SQL_INTEGER | SQL_SMALLINT | SQL_BIGINT | SQL_TINYINT | SQL_BIT => {
            Some(StorageType::Integer)
        }
        SQL_NUMERIC | SQL_DECIMAL | SQL_FLOAT | SQL_REAL | SQL_DOUBLE => Some(StorageType::Real),
        SQL_CHAR | SQL_VARCHAR | SQL_LONGVARCHAR | SQL_WCHAR | SQL_WVARCHAR
        | SQL_WLONGVARCHAR | SQL_GUID => Some(StorageType::Text),
        // Temporal values are kept verbatim as text
        SQL_DATETIME | SQL_TIME | SQL_TIMESTAMP | SQL_TYPE_DATE | SQL_TYPE_TIME
        | SQL_TYPE_TIMESTAMP => Some(StorageType::Text),
        SQL_BINARY | SQL_VARBINARY | SQL_LONGVARBINARY => Some(StorageType::Blob),
        _ => None,
    }
}

fn storage_for_name(name: &str) -> Option<StorageType> {
    let storage = match name {
        "INT" | "INTEGER" | "SMALLINT" | "TINYINT" | "MEDIUMINT" | "BIGINT" | "BIT" | "BOOL"
        | "BOOLEAN" | "INT2" | "INT4" | "INT8" | "SERIAL" | "BIGSERIAL" | "SMALLSERIAL"
        | "COUNTER" | "AUTOINCREMENT" | "BYTE" | "LONG" | "YESNO" => StorageType::Integer,

        "DECIMAL" | "DEC" | "NUMERIC" | "NUMBER" | "FLOAT" | "FLOAT4" | "FLOAT8" | "REAL"
        | "DOUBLE" | "DOUBLE PRECISION" | "MONEY" | "SMALLMONEY" | "CURRENCY"
        | "SINGLE" => StorageType::Real,

        "CHAR" | "CHARACTER" | "CHARACTER VARYING" | "VARCHAR" | "VARCHAR2" | "LONGVARCHAR"
        | "WCHAR" | "WVARCHAR" | "WLONGVARCHAR" | "NCHAR" | "NVARCHAR" | "NVARCHAR2"
        | "NTEXT" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "CLOB" | "NCLOB"
        | "STRING" | "MEMO" | "XML" | "JSON" | "UNIQUEIDENTIFIER" | "GUID" | "UUID"
        | "ENUM" | "SET" => StorageType::Text,

        "DATE" | "TIME" | "DATETIME" | "DATETIME2" | "SMALLDATETIME" | "DATETIMEOFFSET"
        | "TIMESTAMP" | "TIMESTAMPTZ" | "TIMETZ" | "INTERVAL" | "YEAR" => StorageType::Text,

        "BINARY" | "VARBINARY" | "LONGVARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB"
        | "LONGBLOB" | "IMAGE" | "BYTEA" | "RAW" | "LONG RAW" | "OLEOBJECT" => StorageType::Blob,

        // Multi-word names such as "INT IDENTITY" already lost their
        // qualifier; retry with the leading word only.
        _ => {
            let first = name.split_whitespace().next()?;
            if first == name {
                return None;
            }
            return storage_for_name(first);
        }
    };
    Some(storage)
}
