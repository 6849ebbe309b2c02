//! ODBC connection configuration file.
//!
//! ```toml
//! default_connection = "sage100"
//!
//! [[connection]]
//! name = "sage100"
//! dsn = "SOTAMAS90"
//! username = "reader"
//! password = "secret"
//! CompanyCode = "ABC"
//! ```
//!
//! Keys other than the recognised ones are appended to the generated
//! connection string as `KEY=value`, in file order.

use anyhow::{bail, Context};
use mirror_core::{ConnectionSpec, QuirkProfile};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorConfigFile {
    /// Connection used when a request names none
    #[serde(default)]
    pub default_connection: Option<String>,

    #[serde(rename = "connection", default)]
    pub connections: Vec<ConnectionConfig>,
}

/// One `[[connection]]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub name: String,

    /// Complete ODBC connection string, used verbatim when present
    #[serde(default)]
    pub connection_string: Option<String>,

    #[serde(default)]
    pub driver: Option<String>,

    #[serde(default)]
    pub dsn: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Explicit quirk profile; detected from name and connection string otherwise
    #[serde(default)]
    pub quirks: Option<String>,

    /// Accepted for compatibility; mirroring only ever reads from the source
    #[serde(default)]
    pub readonly: Option<bool>,

    /// Driver-specific parameters
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ConnectionConfig {
    /// ODBC connection string for this section.
    pub fn connection_string(&self) -> anyhow::Result<String> {
        if let Some(conn_str) = &self.connection_string {
            if conn_str.trim().is_empty() {
                bail!("Connection '{}' has an empty connection_string", self.name);
            }
            return Ok(conn_str.clone());
        }

        let mut parts = Vec::new();
        if let Some(driver) = &self.driver {
            parts.push(format!("Driver={{{driver}}}"));
        }
        if let Some(dsn) = &self.dsn {
            parts.push(format!("DSN={dsn}"));
        }
        if parts.is_empty() {
            bail!(
                "Connection '{}' needs either connection_string, dsn or driver",
                self.name
            );
        }
        if let Some(username) = &self.username {
            parts.push(format!("UID={username}"));
        }
        if let Some(password) = &self.password {
            parts.push(format!("PWD={password}"));
        }
        for (key, value) in &self.extra {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(_) | toml::Value::Float(_) | toml::Value::Boolean(_) => {
                    value.to_string()
                }
                _ => bail!(
                    "Connection '{}': parameter '{}' must be a string, number or boolean",
                    self.name,
                    key
                ),
            };
            parts.push(format!("{key}={value}"));
        }

        Ok(parts.join(";"))
    }

    /// Resolve into an immutable [`ConnectionSpec`].
    pub fn to_spec(&self) -> anyhow::Result<ConnectionSpec> {
        let connection_string = self.connection_string()?;
        let quirks = match &self.quirks {
            Some(marker) => marker
                .parse::<QuirkProfile>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Connection '{}'", self.name))?,
            None => QuirkProfile::detect(&self.name, &connection_string),
        };
        Ok(ConnectionSpec::new(
            self.name.clone(),
            connection_string,
            quirks,
        ))
    }
}

impl MirrorConfigFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ODBC configuration from {path:?}"))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid ODBC configuration in {path:?}"))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: MirrorConfigFile = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for conn in &self.connections {
            if conn.name.trim().is_empty() {
                bail!("Connection names must not be empty");
            }
            if !seen.insert(conn.name.as_str()) {
                bail!("Duplicate connection name '{}'", conn.name);
            }
        }
        Ok(())
    }

    /// All connections resolved into specs, in file order.
    pub fn connection_specs(&self) -> anyhow::Result<Vec<ConnectionSpec>> {
        self.connections.iter().map(ConnectionConfig::to_spec).collect()
    }
}
