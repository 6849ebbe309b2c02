//! ODBC SQL data type codes.
//!
//! Values as defined by the ODBC 3.x headers (`sql.h` / `sqlext.h`). Catalog
//! functions report them in the `DATA_TYPE` column.

pub const SQL_UNKNOWN_TYPE: i16 = 0;
pub const SQL_CHAR: i16 = 1;
pub const SQL_NUMERIC: i16 = 2;
pub const SQL_DECIMAL: i16 = 3;
pub const SQL_INTEGER: i16 = 4;
pub const SQL_SMALLINT: i16 = 5;
pub const SQL_FLOAT: i16 = 6;
pub const SQL_REAL: i16 = 7;
pub const SQL_DOUBLE: i16 = 8;
/// ODBC 3 verbose datetime type; also the ODBC 2 `SQL_DATE` code
pub const SQL_DATETIME: i16 = 9;
/// ODBC 2 time code
pub const SQL_TIME: i16 = 10;
/// ODBC 2 timestamp code
pub const SQL_TIMESTAMP: i16 = 11;
pub const SQL_VARCHAR: i16 = 12;
pub const SQL_TYPE_DATE: i16 = 91;
pub const SQL_TYPE_TIME: i16 = 92;
pub const SQL_TYPE_TIMESTAMP: i16 = 93;
pub const SQL_LONGVARCHAR: i16 = -1;
pub const SQL_BINARY: i16 = -2;
pub const SQL_VARBINARY: i16 = -3;
pub const SQL_LONGVARBINARY: i16 = -4;
pub const SQL_BIGINT: i16 = -5;
pub const SQL_TINYINT: i16 = -6;
pub const SQL_BIT: i16 = -7;
pub const SQL_WCHAR: i16 = -8;
pub const SQL_WVARCHAR: i16 = -9;
pub const SQL_WLONGVARCHAR: i16 = -10;
pub const SQL_GUID: i16 = -11;

/// Canonical ODBC name for a type code, `UNKNOWN(<code>)` for anything else.
pub fn type_name_for_code(code: i16) -> String {
    let name = match code {
        SQL_CHAR => "CHAR",
        SQL_VARCHAR => "VARCHAR",
        SQL_LONGVARCHAR => "LONGVARCHAR",
        SQL_WCHAR => "WCHAR",
        SQL_WVARCHAR => "WVARCHAR",
        SQL_WLONGVARCHAR => "WLONGVARCHAR",
        SQL_DECIMAL => "DECIMAL",
        SQL_NUMERIC => "NUMERIC",
        SQL_SMALLINT => "SMALLINT",
        SQL_INTEGER => "INTEGER",
        SQL_REAL => "REAL",
        SQL_FLOAT => "FLOAT",
        SQL_DOUBLE => "DOUBLE",
        SQL_BIT => "BIT",
        SQL_TINYINT => "TINYINT",
        SQL_BIGINT => "BIGINT",
        SQL_BINARY => "BINARY",
        SQL_VARBINARY => "VARBINARY",
        SQL_LONGVARBINARY => "LONGVARBINARY",
        SQL_TYPE_DATE | SQL_DATETIME => "DATE",
        SQL_TYPE_TIME | SQL_TIME => "TIME",
        SQL_TYPE_TIMESTAMP | SQL_TIMESTAMP => "TIMESTAMP",
        SQL_GUID => "GUID",
        other => return format!("UNKNOWN({other})"),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_names() {
        assert_eq!(type_name_for_code(SQL_WVARCHAR), "WVARCHAR");
        assert_eq!(type_name_for_code(SQL_TYPE_TIMESTAMP), "TIMESTAMP");
        assert_eq!(type_name_for_code(SQL_TIMESTAMP), "TIMESTAMP");
    }

    #[test]
    fn test_unknown_code_name() {
        assert_eq!(type_name_for_code(-154), "UNKNOWN(-154)");
    }
}
