//! Resolved source connection parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Driver-quirk profile applied while interpreting a source's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuirkProfile {
    /// Standards-conforming driver; type codes and names are trusted.
    #[default]
    Generic,
    /// Sage ProvideX driver family. Reports type codes inconsistently across
    /// otherwise identical columns, so only the declared type name is used.
    ProvideX,
}

impl QuirkProfile {
    /// Infer the profile from a connection's name and connection string when
    /// the configuration carries no explicit marker.
    pub fn detect(connection_name: &str, connection_string: &str) -> Self {
        if connection_string.to_uppercase().contains("PROVIDEX")
            || connection_name.eq_ignore_ascii_case("SAGE100")
        {
            QuirkProfile::ProvideX
        } else {
            QuirkProfile::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuirkProfile::Generic => "generic",
            QuirkProfile::ProvideX => "providex",
        }
    }
}

impl fmt::Display for QuirkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuirkProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generic" | "standard" | "none" => Ok(QuirkProfile::Generic),
            "providex" | "sage100" => Ok(QuirkProfile::ProvideX),
            other => Err(format!(
                "Unknown quirk profile '{other}' (expected 'generic' or 'providex')"
            )),
        }
    }
}

/// A named, fully resolved source connection.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    /// Unique connection name
    pub name: String,
    /// ODBC connection string handed to the driver manager
    pub connection_string: String,
    /// Quirk profile used for type interpretation
    pub quirks: QuirkProfile,
}

impl ConnectionSpec {
    pub fn new(
        name: impl Into<String>,
        connection_string: impl Into<String>,
        quirks: QuirkProfile,
    ) -> Self {
        Self {
            name: name.into(),
            connection_string: connection_string.into(),
            quirks,
        }
    }

    /// Connection string with password values replaced, safe for logging.
    pub fn redacted_connection_string(&self) -> String {
        redact_connection_string(&self.connection_string)
    }
}

// Keeps credentials out of `{:?}` output.
impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("name", &self.name)
            .field("connection_string", &self.redacted_connection_string())
            .field("quirks", &self.quirks)
            .finish()
    }
}

/// Replace `PWD=...` / `PASSWORD=...` values in an ODBC connection string.
pub fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _))
                if key.trim().eq_ignore_ascii_case("pwd")
                    || key.trim().eq_ignore_ascii_case("password") =>
            {
                format!("{key}=***")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}
