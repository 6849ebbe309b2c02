//! ODBC source for odbc-mirror.
//!
//! Implements the `mirror-core` source traits over `odbc-api`:
//!
//! - [`OdbcConnector`] owns the ODBC environment and opens one connection per job
//! - catalog inspection via `SQLColumns`, falling back to describing an empty
//!   result set for drivers with incomplete catalog support
//! - a forward-only block cursor whose rowset buffer stays within a memory
//!   budget, filling each batch from as many fetches as needed
//! - UTF-8 text buffers, or UTF-16 on Windows where narrow text is in the
//!   ANSI code page
//!
//! The Microsoft or unixODBC driver manager and the target driver must be
//! installed on the host.

mod connection;
mod inspect;
mod reader;
mod text;

pub use connection::OdbcConnection;
pub use reader::OdbcBatchReader;

use mirror_core::{ConnectionSpec, QuirkProfile, SourceConnection, SourceConnector, SourceError};
use odbc_api::{ConnectionOptions, Environment};
use tracing::{debug, info};

/// Default upper bound, in bytes, for a single text cell fetched from the source.
pub const DEFAULT_MAX_TEXT_LEN: usize = 65536;

/// Default upper bound, in bytes, for the rowset buffer bound to a cursor.
pub const DEFAULT_ROWSET_BUDGET: usize = 64 * 1024 * 1024;

/// Tunables for reading from an ODBC source.
#[derive(Debug, Clone)]
pub struct OdbcOptions {
    /// Upper bound in bytes for text cells whose column reports no (or an
    /// unbounded) size. Longer values fail the batch instead of truncating.
    pub max_text_len: usize,
    /// Bytes the fetch buffer may occupy; wide rows are fetched in smaller
    /// rowsets and gathered into full batches.
    pub rowset_budget: usize,
}

impl Default for OdbcOptions {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            rowset_budget: DEFAULT_ROWSET_BUDGET,
        }
    }
}

/// Opens ODBC connections from resolved [`ConnectionSpec`]s.
pub struct OdbcConnector {
    env: Environment,
    options: OdbcOptions,
}

impl OdbcConnector {
    /// Create the ODBC environment.
    ///
    /// Fails when no driver manager is available on the host.
    pub fn new(options: OdbcOptions) -> Result<Self, SourceError> {
        let env = Environment::new().map_err(|e| {
            SourceError::Connection(format!(
                "Failed to create ODBC environment: {e}. Make sure an ODBC driver manager \
                 (unixODBC on Linux/macOS) is installed."
            ))
        })?;
        Ok(Self { env, options })
    }
}

impl SourceConnector for OdbcConnector {
    fn connect<'a>(
        &'a self,
        spec: &ConnectionSpec,
    ) -> Result<Box<dyn SourceConnection + 'a>, SourceError> {
        debug!(
            "Connecting to ODBC source '{}': {}",
            spec.name,
            spec.redacted_connection_string()
        );

        let conn = self
            .env
            .connect_with_connection_string(&spec.connection_string, ConnectionOptions::default())
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        if spec.quirks == QuirkProfile::ProvideX {
            // ProvideX rejects manual-commit mode on read connections
            conn.set_autocommit(true)
                .map_err(|e| SourceError::Connection(format!("Failed to enable autocommit: {e}")))?;
            info!("Using ProvideX connection mode with autocommit for '{}'", spec.name);
        }

        Ok(Box::new(OdbcConnection::new(
            conn,
            spec.quirks,
            self.options.clone(),
        )))
    }
}
