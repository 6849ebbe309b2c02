//! SQLite DDL generation from mapped columns.

use mirror_core::{MappedColumnDef, StorageType};

/// Trait for generating DDL from mapped column definitions.
pub trait ToDdl {
    /// Column type keyword for a storage class.
    fn to_ddl(&self, storage: StorageType) -> String;

    /// Complete `CREATE TABLE` statement, columns in the given order.
    fn to_create_table(&self, table_name: &str, columns: &[MappedColumnDef]) -> String;

    /// Parameterised `INSERT` covering every column in the given order.
    fn to_insert(&self, table_name: &str, columns: &[MappedColumnDef]) -> String;
}

/// SQLite DDL generator.
pub struct SqliteDdl;

impl ToDdl for SqliteDdl {
    fn to_ddl(&self, storage: StorageType) -> String {
        storage.as_sql().to_string()
    }

    fn to_create_table(&self, table_name: &str, columns: &[MappedColumnDef]) -> String {
        let column_defs: Vec<String> = columns
            .iter()
            .map(|col| {
                let null_part = if col.nullable() { "NULL" } else { "NOT NULL" };
                format!(
                    "{} {} {}",
                    quote_ident(col.name()),
                    self.to_ddl(col.storage),
                    null_part
                )
            })
            .collect();

        format!(
            "CREATE TABLE {} ({})",
            quote_ident(table_name),
            column_defs.join(", ")
        )
    }

    fn to_insert(&self, table_name: &str, columns: &[MappedColumnDef]) -> String {
        let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c.name())).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table_name),
            column_list.join(", "),
            placeholders.join(", ")
        )
    }
}

/// Quote an identifier for SQLite, doubling embedded quotes:
/// `my"table` becomes `"my""table"`.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{ColumnDef, SourceType};

    fn mapped(name: &str, ordinal: u32, storage: StorageType, nullable: bool) -> MappedColumnDef {
        MappedColumnDef {
            column: ColumnDef::new(name, ordinal, SourceType::named(storage.as_sql()), nullable),
            storage,
        }
    }

    #[test]
    fn test_create_table_orders() {
        let columns = vec![
            mapped("id", 1, StorageType::Integer, false),
            mapped("total", 2, StorageType::Real, true),
            mapped("note", 3, StorageType::Text, true),
        ];
        assert_eq!(
            SqliteDdl.to_create_table("Orders", &columns),
            r#"CREATE TABLE "Orders" ("id" INTEGER NOT NULL, "total" REAL NULL, "note" TEXT NULL)"#
        );
    }

    #[test]
    fn test_insert_statement() {
        let columns = vec![
            mapped("a", 1, StorageType::Blob, true),
            mapped("b c", 2, StorageType::Text, true),
        ];
        assert_eq!(
            SqliteDdl.to_insert("t", &columns),
            r#"INSERT INTO "t" ("a", "b c") VALUES (?1, ?2)"#
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }
}
