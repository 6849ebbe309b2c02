//! Mirror job orchestration.
//!
//! A job walks `Pending -> SchemaResolved -> DestinationReady -> Copying ->
//! Completed`, or drops into `Failed` from any non-terminal state. Each batch
//! read from the source is committed in its own destination transaction, so a
//! failure mid-copy leaves every earlier batch in place and reports how many
//! rows that was.

use crate::locks::TableLocks;
use crate::registry::ConnectionRegistry;
use mirror_core::{ErrorKind, MirrorError, SourceConnector, TableRef, DEFAULT_BATCH_SIZE};
use odbc_types::TypeMapper;
use serde::{Deserialize, Serialize};
use sqlite_sink::SqliteSink;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What to mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRequest {
    pub source_table: String,
    /// Defaults to `source_table`
    pub dest_table: Option<String>,
    /// Defaults to the registry's default connection
    pub connection_name: Option<String>,
    pub overwrite: bool,
}

impl MirrorRequest {
    pub fn new(source_table: impl Into<String>) -> Self {
        Self {
            source_table: source_table.into(),
            ..Default::default()
        }
    }

    pub fn dest_table(mut self, dest_table: impl Into<String>) -> Self {
        self.dest_table = Some(dest_table.into());
        self
    }

    pub fn connection(mut self, connection_name: impl Into<String>) -> Self {
        self.connection_name = Some(connection_name.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Destination table name after applying the default.
    pub fn resolved_dest_table(&self) -> String {
        match &self.dest_table {
            Some(dest) if !dest.trim().is_empty() => dest.clone(),
            _ => self.source_table.clone(),
        }
    }
}

/// Settings shared by every job of one [`TableMirror`].
#[derive(Debug, Clone)]
pub struct MirrorSettings {
    /// Destination database file
    pub sqlite_path: PathBuf,
    /// Rows per batch and per destination transaction
    pub batch_size: usize,
    /// Stop copying after this many rows
    pub max_rows: Option<u64>,
}

impl MirrorSettings {
    pub fn new(sqlite_path: impl Into<PathBuf>) -> Self {
        Self {
            sqlite_path: sqlite_path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_rows: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_rows(mut self, max_rows: Option<u64>) -> Self {
        self.max_rows = max_rows;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    SchemaResolved,
    DestinationReady,
    Copying,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Progress of one job. Owned by the orchestrator for the duration of the
/// call and turned into a [`MirrorResult`] at the end.
#[derive(Debug, Clone)]
pub struct MirrorJob {
    pub source_table: String,
    pub dest_table: String,
    pub connection_name: Option<String>,
    pub overwrite: bool,
    pub batch_size: usize,
    pub max_rows: Option<u64>,
    state: JobState,
    rows_copied: u64,
    batches_committed: u64,
    replaced_existing: bool,
    max_rows_reached: bool,
    error: Option<(MirrorError, JobState)>,
    started: Instant,
}

impl MirrorJob {
    pub fn new(request: &MirrorRequest, settings: &MirrorSettings) -> Self {
        Self {
            source_table: request.source_table.clone(),
            dest_table: request.resolved_dest_table(),
            connection_name: request.connection_name.clone(),
            overwrite: request.overwrite,
            batch_size: settings.batch_size.max(1),
            max_rows: settings.max_rows,
            state: JobState::Pending,
            rows_copied: 0,
            batches_committed: 0,
            replaced_existing: false,
            max_rows_reached: false,
            error: None,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn rows_copied(&self) -> u64 {
        self.rows_copied
    }

    fn advance(&mut self, next: JobState) {
        debug!(
            "Mirror job {} -> {}: {:?} -> {:?}",
            self.source_table, self.dest_table, self.state, next
        );
        self.state = next;
    }

    fn record_batch(&mut self, rows: usize) {
        self.rows_copied += rows as u64;
        self.batches_committed += 1;
    }

    fn fail(&mut self, err: MirrorError) {
        let phase = self.state;
        self.state = JobState::Failed;
        self.error = Some((err, phase));
    }

    fn transfer_error(&self, message: impl std::fmt::Display) -> MirrorError {
        MirrorError::Transfer {
            source_table: self.source_table.clone(),
            dest_table: self.dest_table.clone(),
            rows_copied: self.rows_copied,
            message: message.to_string(),
        }
    }

    /// Rows committed before a panic mid-copy are still reported.
    fn panic_error(&self, message: String) -> MirrorError {
        let message = format!("panicked: {message}");
        if self.state == JobState::Copying {
            self.transfer_error(message)
        } else {
            MirrorError::Internal {
                table: self.dest_table.clone(),
                message,
            }
        }
    }

    pub fn into_result(self) -> MirrorResult {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let (status, error) = match self.error {
            Some((err, phase)) => (
                MirrorStatus::Failure,
                Some(ErrorDetail {
                    kind: err.kind(),
                    message: err.to_string(),
                    phase,
                }),
            ),
            None => (MirrorStatus::Success, None),
        };
        MirrorResult {
            status,
            source_table: self.source_table,
            dest_table: self.dest_table,
            connection_name: self.connection_name,
            rows_copied: self.rows_copied,
            batches_committed: self.batches_committed,
            elapsed_ms,
            replaced_existing: self.replaced_existing,
            max_rows_reached: self.max_rows_reached,
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    /// State the job was in when it failed
    pub phase: JobState,
}

/// Terminal snapshot of a mirror job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorResult {
    pub status: MirrorStatus,
    pub source_table: String,
    pub dest_table: String,
    pub connection_name: Option<String>,
    /// Rows committed to the destination, including before a failure
    pub rows_copied: u64,
    pub batches_committed: u64,
    pub elapsed_ms: u64,
    pub replaced_existing: bool,
    pub max_rows_reached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl MirrorResult {
    pub fn is_success(&self) -> bool {
        self.status == MirrorStatus::Success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Runs mirror jobs against one destination database.
///
/// Cheap to clone; clones share the registry, connector and table guards.
#[derive(Clone)]
pub struct TableMirror {
    registry: Arc<ConnectionRegistry>,
    connector: Arc<dyn SourceConnector>,
    settings: MirrorSettings,
    locks: TableLocks,
}

impl TableMirror {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        connector: Arc<dyn SourceConnector>,
        settings: MirrorSettings,
    ) -> Self {
        Self {
            registry,
            connector,
            settings,
            locks: TableLocks::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &MirrorSettings {
        &self.settings
    }

    /// Mirror one table. Failures are reported in the result, never raised.
    ///
    /// Holds the destination table's guard for the whole job; jobs for other
    /// destination tables proceed concurrently.
    pub async fn mirror_table(&self, request: MirrorRequest) -> MirrorResult {
        let dest_table = request.resolved_dest_table();
        let _guard = self.locks.acquire(&dest_table).await;

        let this = self.clone();
        let job_request = request.clone();
        match tokio::task::spawn_blocking(move || this.run_blocking(&job_request)).await {
            Ok(result) => result,
            Err(e) => {
                let message = if e.is_panic() {
                    format!("mirror task panicked: {}", panic_message(&*e.into_panic()))
                } else {
                    format!("mirror task was cancelled: {e}")
                };
                error!("Mirror task for {} failed: {}", dest_table, message);
                let mut job = MirrorJob::new(&request, &self.settings);
                job.fail(MirrorError::Internal {
                    table: dest_table,
                    message,
                });
                job.into_result()
            }
        }
    }

    /// Run a job on the calling thread.
    ///
    /// Does not take the destination guard; callers running jobs
    /// concurrently go through [`TableMirror::mirror_table`].
    pub fn run_blocking(&self, request: &MirrorRequest) -> MirrorResult {
        let mut job = MirrorJob::new(request, &self.settings);
        info!(
            source_table = %job.source_table,
            dest_table = %job.dest_table,
            overwrite = job.overwrite,
            "Starting mirror job"
        );

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.execute(&mut job))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(job.panic_error(panic_message(&*payload))),
        };

        match outcome {
            Ok(()) => {
                job.advance(JobState::Completed);
                info!(
                    rows_copied = job.rows_copied,
                    batches = job.batches_committed,
                    "Mirrored {} into {}",
                    job.source_table,
                    job.dest_table
                );
            }
            Err(err) => {
                warn!(
                    rows_copied = job.rows_copied,
                    "Mirror of {} into {} failed: {}", job.source_table, job.dest_table, err
                );
                job.fail(err);
            }
        }

        job.into_result()
    }

    /// Source and destination connections are locals here and are closed on
    /// every return path.
    fn execute(&self, job: &mut MirrorJob) -> Result<(), MirrorError> {
        let spec = self.registry.resolve(job.connection_name.as_deref())?;
        job.connection_name = Some(spec.name.clone());

        let table = TableRef::parse(&job.source_table);
        if table.table.trim().is_empty() {
            return Err(MirrorError::TableNotFound {
                table: job.source_table.clone(),
                connection: spec.name.clone(),
            });
        }

        let mut source =
            self.connector
                .connect(spec)
                .map_err(|e| MirrorError::ConnectionFailed {
                    connection: spec.name.clone(),
                    message: e.to_string(),
                })?;

        let columns = source
            .inspect(&table)
            .map_err(|e| MirrorError::SchemaInspection {
                table: job.source_table.clone(),
                connection: spec.name.clone(),
                message: e.to_string(),
            })?;
        if columns.is_empty() {
            return Err(MirrorError::TableNotFound {
                table: job.source_table.clone(),
                connection: spec.name.clone(),
            });
        }

        let mapped = TypeMapper::new(spec.quirks).map_columns(&columns);
        debug!(
            "Mapped {} columns of {} using {} profile",
            mapped.len(),
            table,
            spec.quirks
        );
        job.advance(JobState::SchemaResolved);

        let dest = job.dest_table.clone();
        let mut sink = SqliteSink::open(&self.settings.sqlite_path)
            .map_err(|e| MirrorError::destination(&dest, e))?;
        let exists = sink
            .table_exists(&dest)
            .map_err(|e| MirrorError::destination(&dest, e))?;
        match (exists, job.overwrite) {
            (true, false) => return Err(MirrorError::TableExists { table: dest }),
            (true, true) => {
                sink.replace_table(&dest, &mapped)
                    .map_err(|e| MirrorError::destination(&dest, e))?;
                job.replaced_existing = true;
            }
            (false, _) => sink
                .create_table(&dest, &mapped)
                .map_err(|e| MirrorError::destination(&dest, e))?,
        }
        job.advance(JobState::DestinationReady);

        let mut reader = source
            .open_batches(&table, &mapped, job.batch_size)
            .map_err(|e| job.transfer_error(e))?;
        job.advance(JobState::Copying);

        loop {
            if let Some(max) = job.max_rows {
                if job.rows_copied >= max {
                    job.max_rows_reached = true;
                    info!("Reached max_rows limit of {} for {}", max, job.dest_table);
                    break;
                }
            }

            let mut batch = match reader.next_batch() {
                Ok(Some(batch)) => batch,
                Ok(None) => break,
                Err(e) => return Err(job.transfer_error(e)),
            };
            if let Some(max) = job.max_rows {
                let remaining = (max - job.rows_copied) as usize;
                batch.truncate(remaining);
            }
            if batch.is_empty() {
                continue;
            }

            let inserted = sink
                .insert_batch(&dest, &mapped, &batch)
                .map_err(|e| job.transfer_error(e))?;
            job.record_batch(inserted);
            debug!(
                "Committed batch {} ({} rows, {} total) into {}",
                job.batches_committed, inserted, job.rows_copied, dest
            );
        }

        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
