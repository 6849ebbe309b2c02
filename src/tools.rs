//! Capabilities exposed to an invocation transport.
//!
//! Two tools are offered: `mirror-table` and `list-odbc-connections`. Each
//! takes a JSON argument object and produces a [`ToolOutput`] that renders
//! either as JSON or as a Markdown summary.

use crate::mirror::{MirrorRequest, MirrorResult, TableMirror};
use crate::registry::ConnectionRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;
use thiserror::Error;
use tracing::{error, info};

pub const MIRROR_TABLE: &str = "mirror-table";
pub const LIST_ODBC_CONNECTIONS: &str = "list-odbc-connections";

#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Name, description and JSON input schema of a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn list_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: MIRROR_TABLE,
            description: "Mirror a table from ODBC to SQLite",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source_table": {
                        "type": "string",
                        "description": "Name of the source table in ODBC"
                    },
                    "dest_table": {
                        "type": "string",
                        "description": "Name of the destination table in SQLite (optional, defaults to source name)"
                    },
                    "connection_name": {
                        "type": "string",
                        "description": "Name of the ODBC connection to use (optional, uses default if not specified)"
                    },
                    "overwrite": {
                        "type": "boolean",
                        "description": "Whether to replace an existing destination table (optional, defaults to false)"
                    }
                },
                "required": ["source_table"]
            }),
        },
        ToolDescriptor {
            name: LIST_ODBC_CONNECTIONS,
            description: "List all configured ODBC connections",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ]
}

/// Arguments of `mirror-table`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorTableArgs {
    #[serde(default)]
    pub source_table: Option<String>,
    #[serde(default)]
    pub dest_table: Option<String>,
    #[serde(default)]
    pub connection_name: Option<String>,
    #[serde(default)]
    pub overwrite: Option<bool>,
}

impl MirrorTableArgs {
    pub fn into_request(self) -> Result<MirrorRequest, ToolError> {
        let source_table = self
            .source_table
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments {
                tool: MIRROR_TABLE.to_string(),
                message: "Source table is required".to_string(),
            })?;
        Ok(MirrorRequest {
            source_table,
            dest_table: self.dest_table.filter(|t| !t.trim().is_empty()),
            connection_name: self.connection_name.filter(|c| !c.trim().is_empty()),
            overwrite: self.overwrite.unwrap_or(false),
        })
    }
}

/// Output of `list-odbc-connections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionList {
    /// Names in load order
    pub connections: Vec<String>,
    pub default_connection: Option<String>,
}

impl ConnectionList {
    pub fn from_registry(registry: &ConnectionRegistry) -> Self {
        Self {
            connections: registry.names(),
            default_connection: registry.default_name().map(str::to_string),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Available ODBC Connections\n\n");
        if let Some(default) = &self.default_connection {
            let _ = writeln!(out, "Default connection: `{default}`\n");
        }
        out.push_str("### Connections\n\n");
        if self.connections.is_empty() {
            out.push_str("_No connections configured._\n");
        }
        for name in &self.connections {
            let marker = if Some(name) == self.default_connection.as_ref() {
                " (default)"
            } else {
                ""
            };
            let _ = writeln!(out, "- `{name}`{marker}");
        }
        out
    }
}

/// Markdown summary of a mirror result.
pub fn mirror_result_markdown(result: &MirrorResult, max_rows: Option<u64>) -> String {
    let mut out = String::new();
    match &result.error {
        None => {
            out.push_str("## Table Mirroring Successful\n\n");
            let _ = writeln!(out, "- Source table: `{}`", result.source_table);
            let _ = writeln!(out, "- Destination table: `{}`", result.dest_table);
            if let Some(conn) = &result.connection_name {
                let _ = writeln!(out, "- Connection: `{conn}`");
            }
            let _ = writeln!(out, "- Rows copied: {}", result.rows_copied);
            if result.replaced_existing {
                out.push_str("- Existing SQLite table was replaced\n");
            } else {
                out.push_str("- SQLite table was created\n");
            }
            if result.max_rows_reached {
                let limit = max_rows.unwrap_or(result.rows_copied);
                let _ = write!(
                    out,
                    "\n**Note:** Maximum row limit of {limit} was reached. \
                     Some rows may not have been copied."
                );
            }
        }
        Some(detail) => {
            out.push_str("## Table Mirroring Failed\n\n");
            let _ = writeln!(out, "Error: {}", detail.message);
            if result.rows_copied > 0 {
                let _ = writeln!(
                    out,
                    "\n**Note:** {} rows were committed to `{}` before the failure.",
                    result.rows_copied, result.dest_table
                );
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Mirror {
        result: MirrorResult,
        max_rows: Option<u64>,
    },
    Connections(ConnectionList),
}

impl ToolOutput {
    /// `false` only for a failed mirror job.
    pub fn is_success(&self) -> bool {
        match self {
            ToolOutput::Mirror { result, .. } => result.is_success(),
            ToolOutput::Connections(_) => true,
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            ToolOutput::Mirror { result, .. } => serde_json::to_value(result),
            ToolOutput::Connections(list) => serde_json::to_value(list),
        }
    }

    pub fn to_markdown(&self) -> String {
        match self {
            ToolOutput::Mirror { result, max_rows } => mirror_result_markdown(result, *max_rows),
            ToolOutput::Connections(list) => list.to_markdown(),
        }
    }
}

/// Dispatch a tool call by name.
///
/// Mirror failures come back as a failed [`MirrorResult`] inside `Ok`; only
/// an unknown tool or malformed arguments produce `Err`.
pub async fn call_tool(
    mirror: &TableMirror,
    name: &str,
    arguments: Value,
) -> Result<ToolOutput, ToolError> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };

    match name {
        MIRROR_TABLE => {
            let args: MirrorTableArgs =
                serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
                    tool: name.to_string(),
                    message: e.to_string(),
                })?;
            let request = args.into_request()?;
            info!(
                "Tool {}: {} -> {} (connection: {}, overwrite: {})",
                name,
                request.source_table,
                request.resolved_dest_table(),
                request.connection_name.as_deref().unwrap_or("(default)"),
                request.overwrite
            );
            let result = mirror.mirror_table(request).await;
            Ok(ToolOutput::Mirror {
                result,
                max_rows: mirror.settings().max_rows,
            })
        }
        LIST_ODBC_CONNECTIONS => Ok(ToolOutput::Connections(ConnectionList::from_registry(
            mirror.registry(),
        ))),
        other => {
            error!("Unknown tool requested: {}", other);
            Err(ToolError::UnknownTool(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::MirrorStatus;

    #[test]
    fn test_args_require_source_table() {
        let err = MirrorTableArgs::default().into_request().unwrap_err();
        assert_eq!(
            err,
            ToolError::InvalidArguments {
                tool: MIRROR_TABLE.to_string(),
                message: "Source table is required".to_string(),
            }
        );

        let blank: MirrorTableArgs = serde_json::from_value(json!({"source_table": ""})).unwrap();
        assert!(blank.into_request().is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args: MirrorTableArgs =
            serde_json::from_value(json!({"source_table": "Orders"})).unwrap();
        let request = args.into_request().unwrap();
        assert_eq!(request, MirrorRequest::new("Orders"));
        assert_eq!(request.resolved_dest_table(), "Orders");
    }

    #[test]
    fn test_list_markdown_marks_default() {
        let list = ConnectionList {
            connections: vec!["a".to_string(), "sage100".to_string()],
            default_connection: Some("sage100".to_string()),
        };
        assert_eq!(
            list.to_markdown(),
            "## Available ODBC Connections\n\n\
             Default connection: `sage100`\n\n\
             ### Connections\n\n\
             - `a`\n\
             - `sage100` (default)\n"
        );
    }

    #[test]
    fn test_failure_markdown_mentions_committed_rows() {
        let result = MirrorResult {
            status: MirrorStatus::Failure,
            source_table: "big".to_string(),
            dest_table: "big".to_string(),
            connection_name: Some("erp".to_string()),
            rows_copied: 2000,
            batches_committed: 2,
            elapsed_ms: 10,
            replaced_existing: false,
            max_rows_reached: false,
            error: Some(crate::mirror::ErrorDetail {
                kind: mirror_core::ErrorKind::TransferError,
                message: "boom".to_string(),
                phase: crate::mirror::JobState::Copying,
            }),
        };
        let md = mirror_result_markdown(&result, None);
        assert!(md.starts_with("## Table Mirroring Failed"));
        assert!(md.contains("Error: boom"));
        assert!(md.contains("2000 rows were committed to `big`"));
    }

    #[test]
    fn test_tool_descriptors() {
        let names: Vec<_> = list_tools().iter().map(|t| t.name).collect();
        assert_eq!(names, vec![MIRROR_TABLE, LIST_ODBC_CONNECTIONS]);
    }
}
