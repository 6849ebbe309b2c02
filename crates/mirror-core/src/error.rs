//! Error taxonomy for mirror jobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure of a mirror job, carrying enough context for the caller to decide
/// between retrying, fixing configuration, or fixing the destination by hand.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MirrorError {
    /// Requested (or default) connection name has no configuration
    #[error("{}", connection_not_found_message(.name, .available))]
    ConnectionNotFound {
        /// `None` when the default connection was requested
        name: Option<String>,
        available: Vec<String>,
    },

    /// The source driver refused the connection
    #[error("Failed to connect to '{connection}': {message}")]
    ConnectionFailed { connection: String, message: String },

    /// Source catalog reports no columns for the table
    #[error("Table '{table}' not found on connection '{connection}' (catalog reported no columns)")]
    TableNotFound { table: String, connection: String },

    /// Destination table already present and overwrite was not requested
    #[error("Destination table '{table}' already exists; set overwrite=true to replace it")]
    TableExists { table: String },

    /// The catalog query itself failed
    #[error("Failed to inspect schema of '{table}' on connection '{connection}': {message}")]
    SchemaInspection {
        table: String,
        connection: String,
        message: String,
    },

    /// A batch failed partway through copying; earlier batches stay committed
    #[error("Transfer from '{source_table}' to '{dest_table}' failed after {rows_copied} committed rows: {message}")]
    Transfer {
        source_table: String,
        dest_table: String,
        rows_copied: u64,
        message: String,
    },

    /// The destination store could not be opened or prepared
    #[error("Destination error for table '{table}': {message}")]
    Destination { table: String, message: String },

    /// A job aborted on a panic or a cancelled worker before it could
    /// report a more specific error
    #[error("Mirror job for '{table}' aborted unexpectedly: {message}")]
    Internal { table: String, message: String },
}

fn connection_not_found_message(name: &Option<String>, available: &[String]) -> String {
    let known = if available.is_empty() {
        "no connections are configured".to_string()
    } else {
        format!("configured connections: {}", available.join(", "))
    };
    match name {
        Some(name) => format!("Connection '{name}' not found in configuration ({known})"),
        None => format!("No default connection could be determined ({known})"),
    }
}

impl MirrorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MirrorError::ConnectionNotFound { .. } => ErrorKind::ConnectionNotFound,
            MirrorError::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            MirrorError::TableNotFound { .. } => ErrorKind::TableNotFound,
            MirrorError::TableExists { .. } => ErrorKind::TableExists,
            MirrorError::SchemaInspection { .. } => ErrorKind::SchemaInspectionError,
            MirrorError::Transfer { .. } => ErrorKind::TransferError,
            MirrorError::Destination { .. } => ErrorKind::DestinationError,
            MirrorError::Internal { .. } => ErrorKind::InternalError,
        }
    }

    pub fn destination(table: impl Into<String>, message: impl fmt::Display) -> Self {
        MirrorError::Destination {
            table: table.into(),
            message: message.to_string(),
        }
    }
}

/// Machine-readable discriminant of [`MirrorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectionNotFound,
    ConnectionFailed,
    TableNotFound,
    TableExists,
    SchemaInspectionError,
    TransferError,
    DestinationError,
    InternalError,
}

/// Failure reported by a source implementation.
///
/// The orchestrator lifts these into [`MirrorError`] according to the phase
/// the job was in.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("catalog query failed: {0}")]
    Catalog(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_not_found_names_default() {
        let err = MirrorError::ConnectionNotFound {
            name: None,
            available: vec![],
        };
        assert_eq!(
            err.to_string(),
            "No default connection could be determined (no connections are configured)"
        );
        assert_eq!(err.kind(), ErrorKind::ConnectionNotFound);
    }

    #[test]
    fn test_connection_not_found_lists_available() {
        let err = MirrorError::ConnectionNotFound {
            name: Some("erp".into()),
            available: vec!["crm".into(), "hr".into()],
        };
        assert!(err.to_string().contains("'erp'"));
        assert!(err.to_string().contains("crm, hr"));
    }

    #[test]
    fn test_transfer_error_reports_rows_copied() {
        let err = MirrorError::Transfer {
            source_table: "Orders".into(),
            dest_table: "orders_copy".into(),
            rows_copied: 2000,
            message: "NOT NULL constraint failed".into(),
        };
        assert!(err.to_string().contains("after 2000 committed rows"));
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::SchemaInspectionError).unwrap();
        assert_eq!(json, "\"schema_inspection_error\"");
        let json = serde_json::to_string(&ErrorKind::InternalError).unwrap();
        assert_eq!(json, "\"internal_error\"");
    }
}
