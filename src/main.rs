//! Command-line interface for odbc-mirror
//!
//! # Usage Examples
//!
//! ```bash
//! # Mirror a table through the default connection
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db \
//!   mirror-table --source-table Orders
//!
//! # Replace an existing copy, reading from a named connection
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db \
//!   mirror-table --source-table AR_Customer --connection-name sage100 --overwrite
//!
//! # List configured connections as Markdown
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db \
//!   list-odbc-connections --format markdown
//!
//! # Invoke a tool by name with JSON arguments
//! odbc-mirror --odbc-config odbc.toml --sqlite-db mirror.db \
//!   call mirror-table --arguments '{"source_table": "Orders", "overwrite": true}'
//! ```
//!
//! Logs go to stderr (filter with `RUST_LOG`); results go to stdout.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use odbc_mirror::config::MirrorConfigFile;
use odbc_mirror::tools::{self, ToolOutput};
use odbc_mirror::{ConnectionRegistry, MirrorOpts, MirrorRequest, MirrorSettings, TableMirror};
use odbc_source::{OdbcConnector, OdbcOptions};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "odbc-mirror")]
#[command(about = "A tool for mirroring ODBC tables into a local SQLite database")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    opts: MirrorOpts,

    /// Output format for results
    #[arg(long, value_enum, default_value = "json", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy one table from an ODBC source into SQLite
    MirrorTable {
        /// Source table, optionally qualified as schema.table
        #[arg(long)]
        source_table: String,

        /// Destination table (default: the source table name)
        #[arg(long)]
        dest_table: Option<String>,

        /// ODBC connection name (default: the configured default connection)
        #[arg(long)]
        connection_name: Option<String>,

        /// Drop and recreate the destination table if it exists
        #[arg(long)]
        overwrite: bool,
    },

    /// List configured ODBC connections
    ListOdbcConnections,

    /// Invoke a tool by name with JSON arguments
    Call {
        /// Tool name (mirror-table or list-odbc-connections)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        arguments: String,
    },

    /// Print the tool descriptors as JSON
    ListTools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::ListTools => {
            println!("{}", serde_json::to_string_pretty(&tools::list_tools())?);
            return Ok(());
        }
        Commands::MirrorTable {
            source_table,
            dest_table,
            connection_name,
            overwrite,
        } => {
            let mirror = build_mirror(&cli.opts)?;
            let request = MirrorRequest {
                source_table,
                dest_table,
                connection_name,
                overwrite,
            };
            ToolOutput::Mirror {
                result: mirror.mirror_table(request).await,
                max_rows: cli.opts.max_rows,
            }
        }
        Commands::ListOdbcConnections => {
            let mirror = build_mirror(&cli.opts)?;
            tools::call_tool(&mirror, tools::LIST_ODBC_CONNECTIONS, serde_json::Value::Null)
                .await?
        }
        Commands::Call { tool, arguments } => {
            let arguments: serde_json::Value = serde_json::from_str(&arguments)
                .context("--arguments must be a JSON object")?;
            let mirror = build_mirror(&cli.opts)?;
            tools::call_tool(&mirror, &tool, arguments).await?
        }
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output.to_json()?)?),
        OutputFormat::Markdown => println!("{}", output.to_markdown()),
    }

    if !output.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn build_mirror(opts: &MirrorOpts) -> anyhow::Result<TableMirror> {
    validate_paths(opts)?;

    let config = MirrorConfigFile::from_file(&opts.odbc_config)?;
    let registry = ConnectionRegistry::from_config(&config)
        .with_context(|| format!("Invalid connections in {:?}", opts.odbc_config))?;
    if registry.is_empty() {
        warn!("No connections found in {:?}", opts.odbc_config);
    }
    info!(
        "Loaded {} ODBC connections (default: {})",
        registry.len(),
        registry.default_name().unwrap_or("(none)")
    );

    let connector =
        OdbcConnector::new(OdbcOptions::from(opts)).context("Failed to initialise ODBC")?;
    info!("SQLite destination: {:?}", opts.sqlite_db);

    Ok(TableMirror::new(
        Arc::new(registry),
        Arc::new(connector),
        MirrorSettings::from(opts),
    ))
}

fn validate_paths(opts: &MirrorOpts) -> anyhow::Result<()> {
    if !opts.odbc_config.exists() {
        bail!("ODBC configuration file not found: {:?}", opts.odbc_config);
    }
    if let Some(parent) = opts.sqlite_db.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            bail!("SQLite database directory not found: {:?}", parent);
        }
    }
    Ok(())
}
