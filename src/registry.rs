//! Named source connections, loaded once at startup.

use crate::config::MirrorConfigFile;
use anyhow::bail;
use mirror_core::{ConnectionSpec, MirrorError};

/// Immutable set of configured connections plus the default.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Vec<ConnectionSpec>,
    default: Option<String>,
}

impl ConnectionRegistry {
    /// Build a registry from resolved specs in load order.
    ///
    /// Without an explicit `default`, a registry holding exactly one
    /// connection treats it as the default.
    pub fn new(connections: Vec<ConnectionSpec>, default: Option<String>) -> anyhow::Result<Self> {
        if let Some(name) = &default {
            if !connections.iter().any(|c| &c.name == name) {
                bail!("Default connection '{name}' is not configured");
            }
        }
        let default = default.or_else(|| match connections.as_slice() {
            [only] => Some(only.name.clone()),
            _ => None,
        });
        Ok(Self {
            connections,
            default,
        })
    }

    pub fn from_config(config: &MirrorConfigFile) -> anyhow::Result<Self> {
        Self::new(config.connection_specs()?, config.default_connection.clone())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up `name`, or the default connection when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<&ConnectionSpec, MirrorError> {
        let wanted = name.or(self.default.as_deref());
        wanted
            .and_then(|n| self.connections.iter().find(|c| c.name == n))
            .ok_or_else(|| MirrorError::ConnectionNotFound {
                name: name.map(str::to_string),
                available: self.names(),
            })
    }

    /// Connections in load order.
    pub fn list(&self) -> &[ConnectionSpec] {
        &self.connections
    }

    pub fn names(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.name.clone()).collect()
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
