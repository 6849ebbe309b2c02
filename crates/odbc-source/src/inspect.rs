//! Source schema inspection.

use mirror_core::{ColumnDef, QuirkProfile, SourceError, SourceType, TableRef};
use crate::text::{decode, text_rows};
use odbc_api::{ColumnDescription, Connection, Cursor, DataType, Nullability, ResultSetMetadata};
use odbc_types::codes::*;
use tracing::{debug, warn};

// Zero-based positions in the SQLColumns result set
const COL_TABLE_SCHEM: usize = 1;
const COL_TABLE_NAME: usize = 2;
const COL_COLUMN_NAME: usize = 3;
const COL_DATA_TYPE: usize = 4;
const COL_TYPE_NAME: usize = 5;
const COL_COLUMN_SIZE: usize = 6;
const COL_DECIMAL_DIGITS: usize = 8;
const COL_NULLABLE: usize = 10;
/// Only present for ODBC 3 drivers
const COL_ORDINAL_POSITION: usize = 16;

const CATALOG_BATCH: usize = 64;
const CATALOG_MAX_STR: usize = 4096;

// SQLColumns NULLABLE values
const SQL_NO_NULLS: i16 = 0;

/// Raw text of one catalog row.
struct CatalogRow(Vec<Option<String>>);

impl CatalogRow {
    fn text(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).and_then(|v| v.as_deref())
    }

    fn parse<T: std::str::FromStr>(&self, idx: usize) -> Option<T> {
        self.text(idx).and_then(|s| s.trim().parse().ok())
    }
}

/// Query the catalog for `table`'s columns, ordered by ordinal position.
pub(crate) fn catalog_columns(
    conn: &Connection<'_>,
    table: &TableRef,
) -> Result<Vec<ColumnDef>, SourceError> {
    // An empty catalog argument means "tables without a catalog"; use the
    // connection's current one. Schema and column are search patterns.
    let catalog = conn.current_catalog().unwrap_or_default();
    let schema_pattern = table.schema.as_deref().unwrap_or("%");

    let mut cursor = conn
        .columns(&catalog, schema_pattern, &table.table, "%")
        .map_err(|e| SourceError::Catalog(e.to_string()))?;

    let num_cols = cursor
        .num_result_cols()
        .map_err(|e| SourceError::Catalog(format!("Failed to get column count: {e}")))?
        as usize;

    let buffers = text_rows(CATALOG_BATCH, &vec![CATALOG_MAX_STR; num_cols])
        .map_err(|e| SourceError::Catalog(format!("Failed to create row buffer: {e}")))?;
    let mut row_cursor = cursor
        .bind_buffer(buffers)
        .map_err(|e| SourceError::Catalog(format!("Failed to bind buffer: {e}")))?;

    let mut rows = Vec::new();
    while let Some(batch) = row_cursor
        .fetch()
        .map_err(|e| SourceError::Catalog(format!("Failed to fetch catalog rows: {e}")))?
    {
        for row_idx in 0..batch.num_rows() {
            let row = (0..num_cols)
                .map(|col_idx| batch.column(col_idx).get(row_idx).map(decode))
                .collect();
            rows.push(CatalogRow(row));
        }
    }

    Ok(columns_from_catalog_rows(rows, table, num_cols))
}

fn columns_from_catalog_rows(
    rows: Vec<CatalogRow>,
    table: &TableRef,
    num_cols: usize,
) -> Vec<ColumnDef> {
    // Table name is a search pattern ("_" matches any character), so keep
    // exact matches only. Case-sensitive sources may hold both `orders` and
    // `Orders`; the exact spelling wins and case folding is the fallback.
    // Without an explicit schema, stick to the first schema the catalog
    // reports.
    let exact_case = rows
        .iter()
        .any(|row| row.text(COL_TABLE_NAME) == Some(table.table.as_str()));
    let mut first_schema: Option<Option<String>> = None;
    let mut columns = Vec::new();

    for row in rows {
        let Some(table_name) = row.text(COL_TABLE_NAME) else {
            continue;
        };
        let matches = if exact_case {
            table_name == table.table
        } else {
            table_name.eq_ignore_ascii_case(&table.table)
        };
        if !matches {
            continue;
        }

        let schema = row.text(COL_TABLE_SCHEM).map(str::to_string);
        let first = first_schema.get_or_insert_with(|| schema.clone());
        if *first != schema {
            warn!(
                "Table {} also exists in schema {:?}; using {:?}",
                table,
                schema.as_deref().unwrap_or("<none>"),
                first.as_deref().unwrap_or("<none>")
            );
            continue;
        }

        let Some(name) = row.text(COL_COLUMN_NAME).map(str::to_string) else {
            continue;
        };

        let mut source_type =
            SourceType::named(row.text(COL_TYPE_NAME).unwrap_or_default().to_string());
        source_type.code = row.parse(COL_DATA_TYPE);
        source_type.size = row.parse(COL_COLUMN_SIZE);
        source_type.scale = row.parse(COL_DECIMAL_DIGITS);

        // Unknown nullability (2) is treated as nullable so no NOT NULL
        // constraint can reject source rows.
        let nullable = row.parse::<i16>(COL_NULLABLE) != Some(SQL_NO_NULLS);

        let ordinal = if num_cols > COL_ORDINAL_POSITION {
            row.parse(COL_ORDINAL_POSITION)
        } else {
            None
        }
        .unwrap_or(columns.len() as u32 + 1);

        columns.push(ColumnDef::new(name, ordinal, source_type, nullable));
    }

    columns.sort_by_key(|c| c.ordinal);
    columns
}

/// Describe the result set of an always-empty query over `table`.
pub(crate) fn describe_columns(
    conn: &Connection<'_>,
    table: &TableRef,
    quirks: QuirkProfile,
) -> Result<Vec<ColumnDef>, SourceError> {
    let sql = format!("SELECT * FROM {} WHERE 1=0", table.qualified());
    debug!("Attempting to get schema via describe: {}", sql);

    let Some(mut cursor) = conn
        .execute(&sql, ())
        .map_err(|e| SourceError::Query(format!("{e} - SQL: {sql}")))?
    else {
        return Ok(Vec::new());
    };

    let num_cols = cursor
        .num_result_cols()
        .map_err(|e| SourceError::Query(format!("Failed to get column count: {e}")))?;

    let mut columns = Vec::with_capacity(num_cols.max(0) as usize);
    for i in 1..=num_cols.max(0) as u16 {
        let name = cursor
            .col_name(i)
            .map_err(|e| SourceError::Query(format!("Failed to describe column {i}: {e}")))?;
        let data_type = cursor
            .col_data_type(i)
            .map_err(|e| SourceError::Query(format!("Failed to describe column {i}: {e}")))?;
        let mut desc = ColumnDescription::default();
        let nullable = !matches!(
            cursor.describe_col(i, &mut desc).map(|()| desc.nullability),
            Ok(Nullability::NoNulls)
        );

        let source_type = describe_type(&data_type, quirks);
        columns.push(ColumnDef::new(name, u32::from(i), source_type, nullable));
    }
    Ok(columns)
}

/// Describe metadata carries no driver type name; use the canonical ODBC
/// name so quirk profiles keyed by name still apply.
fn describe_type(data_type: &DataType, quirks: QuirkProfile) -> SourceType {
    let (code, scale) = match data_type {
        DataType::Char { .. } => (SQL_CHAR, None),
        DataType::WChar { .. } => (SQL_WCHAR, None),
        DataType::Varchar { .. } => (SQL_VARCHAR, None),
        DataType::WVarchar { .. } => (SQL_WVARCHAR, None),
        DataType::LongVarchar { .. } => (SQL_LONGVARCHAR, None),
        DataType::Numeric { scale, .. } => (SQL_NUMERIC, Some(*scale)),
        DataType::Decimal { scale, .. } => (SQL_DECIMAL, Some(*scale)),
        DataType::Integer => (SQL_INTEGER, None),
        DataType::SmallInt => (SQL_SMALLINT, None),
        DataType::TinyInt => (SQL_TINYINT, None),
        DataType::BigInt => (SQL_BIGINT, None),
        DataType::Bit => (SQL_BIT, None),
        DataType::Float { .. } => (SQL_FLOAT, None),
        DataType::Real => (SQL_REAL, None),
        DataType::Double => (SQL_DOUBLE, None),
        DataType::Date => (SQL_TYPE_DATE, None),
        DataType::Time { .. } => (SQL_TYPE_TIME, None),
        DataType::Timestamp { .. } => (SQL_TYPE_TIMESTAMP, None),
        DataType::Binary { .. } => (SQL_BINARY, None),
        DataType::Varbinary { .. } => (SQL_VARBINARY, None),
        DataType::LongVarbinary { .. } => (SQL_LONGVARBINARY, None),
        _ => (SQL_UNKNOWN_TYPE, None),
    };

    let mut source_type = SourceType::named(type_name_for_code(code));
    if quirks == QuirkProfile::Generic && code != SQL_UNKNOWN_TYPE {
        source_type.code = Some(code);
    }
    source_type.scale = scale;
    source_type
}
