//! Bootstrap orchestration.
//!
//! Decides whether a snapshot is needed, drives the snapshot producer and the
//! replay, and hands the snapshot position to live replication.

use document_sink::DocumentSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sync_core::{BinlogPosition, RuleSet};
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use crate::coerce::RowCoercer;
use crate::dumper::SnapshotProducer;
use crate::error::BootstrapError;
use crate::handoff::{HandoffError, PositionHandoff};
use crate::parser::parse_dump;
use crate::scope::SnapshotScope;
use crate::state::BootstrapState;
use crate::SyncOpts;

/// What to do when live replication does not reach the snapshot position in
/// time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffTimeoutPolicy {
    /// Fail the bootstrap; the snapshot position is not recorded
    #[default]
    Fail,
    /// Log a warning and record the snapshot position anyway
    Proceed,
}

impl fmt::Display for HandoffTimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffTimeoutPolicy::Fail => write!(f, "fail"),
            HandoffTimeoutPolicy::Proceed => write!(f, "proceed"),
        }
    }
}

impl FromStr for HandoffTimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(HandoffTimeoutPolicy::Fail),
            "proceed" => Ok(HandoffTimeoutPolicy::Proceed),
            other => Err(format!(
                "invalid handoff timeout policy '{other}', expected 'fail' or 'proceed'"
            )),
        }
    }
}

/// Why a bootstrap run did not take a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The pipeline already has a resumable position
    ResumeFromPosition(BinlogPosition),
    /// No snapshot producer is configured
    NoDumper,
    /// No table is tracked
    NoRules,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ResumeFromPosition(pos) => write!(f, "resuming from {pos}"),
            SkipReason::NoDumper => write!(f, "no snapshot producer configured"),
            SkipReason::NoRules => write!(f, "no sync rules"),
        }
    }
}

/// Outcome of a successful bootstrap run.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapReport {
    Skipped(SkipReason),
    Completed {
        /// Binlog position the snapshot is consistent with
        position: BinlogPosition,
        /// Position live replication reported, `None` if the wait timed out
        /// under [`HandoffTimeoutPolicy::Proceed`]
        reached: Option<BinlogPosition>,
        dump_elapsed: Duration,
        parse_elapsed: Duration,
        handoff_elapsed: Duration,
        rows_seen: u64,
        rows_synced: u64,
        rows_discarded: u64,
        unknown_tables: u64,
        sync_failures: u64,
    },
}

/// Runs one bootstrap: snapshot, replay, handoff.
pub struct DumpOrchestrator {
    rules: RuleSet,
    producer: Option<Arc<dyn SnapshotProducer>>,
    sink: Arc<dyn DocumentSink>,
    state: BootstrapState,
    opts: SyncOpts,
    handoff: PositionHandoff,
}

impl DumpOrchestrator {
    /// Create an orchestrator without a snapshot producer.
    pub fn new(
        rules: RuleSet,
        sink: Arc<dyn DocumentSink>,
        state: BootstrapState,
        opts: SyncOpts,
        handoff: PositionHandoff,
    ) -> Self {
        Self {
            rules,
            producer: None,
            sink,
            state,
            opts,
            handoff,
        }
    }

    pub fn with_producer(mut self, producer: Arc<dyn SnapshotProducer>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Run the bootstrap.
    ///
    /// The snapshot artifact lives in `data_dir` for the duration of the run
    /// and is removed on every exit path.
    pub async fn run(mut self) -> Result<BootstrapReport, BootstrapError> {
        if let Some(position) = self
            .state
            .last_known_position()
            .await
            .map_err(BootstrapError::State)?
        {
            info!("Found last known binlog position {position}, skip dump");
            return Ok(BootstrapReport::Skipped(SkipReason::ResumeFromPosition(
                position,
            )));
        }

        let Some(producer) = self.producer.clone() else {
            info!("No snapshot producer configured, skip dump");
            return Ok(BootstrapReport::Skipped(SkipReason::NoDumper));
        };

        let Some(scope) = SnapshotScope::from_rules(&self.rules) else {
            warn!("No sync rules configured, skip dump");
            return Ok(BootstrapReport::Skipped(SkipReason::NoRules));
        };

        tokio::fs::create_dir_all(&self.opts.data_dir)
            .await
            .map_err(BootstrapError::Artifact)?;
        let artifact = tempfile::Builder::new()
            .prefix("dump-")
            .suffix(".sql")
            .tempfile_in(&self.opts.data_dir)
            .map_err(BootstrapError::Artifact)?;
        debug!("Snapshot artifact {}", artifact.path().display());

        let dump_start = Instant::now();
        let out = artifact
            .as_file()
            .try_clone()
            .map_err(BootstrapError::Artifact)?;
        producer
            .dump(&scope, out)
            .await
            .map_err(BootstrapError::Dump)?;
        let dump_elapsed = dump_start.elapsed();
        info!("Dump MySQL takes {dump_elapsed:?}");

        // A fresh handle starts reading at the beginning of the artifact.
        let input = artifact.reopen().map_err(BootstrapError::Artifact)?;
        let reader = BufReader::new(tokio::fs::File::from_std(input));

        let parse_start = Instant::now();
        let mut coercer = RowCoercer::new(&self.rules, self.sink.as_ref());
        let summary = parse_dump(reader, &mut coercer)
            .await
            .map_err(BootstrapError::Parse)?;
        let stats = coercer.stats();
        let parse_elapsed = parse_start.elapsed();
        info!(
            "Parse dump MySQL data takes {parse_elapsed:?}: {} rows seen, {} synced, {} discarded, {} untracked, {} sync failures",
            summary.rows_seen,
            stats.rows_synced,
            stats.rows_discarded,
            stats.unknown_tables,
            stats.sync_failures
        );

        if let Err(e) = artifact.close() {
            warn!("Failed to remove snapshot artifact: {e}");
        }

        let position = summary.position.ok_or(BootstrapError::MissingPosition)?;

        info!("Handing off snapshot position {position}");
        let handoff_start = Instant::now();
        self.handoff
            .publish(position.clone())
            .await
            .map_err(BootstrapError::Handoff)?;
        let reached = match self
            .handoff
            .wait_until_reached(&position, self.opts.handoff_timeout)
            .await
        {
            Ok(reached) => Some(reached),
            Err(e @ HandoffError::Timeout { .. })
                if self.opts.on_handoff_timeout == HandoffTimeoutPolicy::Proceed =>
            {
                warn!("{e}, proceeding");
                None
            }
            Err(e) => return Err(BootstrapError::Handoff(e)),
        };
        let handoff_elapsed = handoff_start.elapsed();
        info!("Handoff takes {handoff_elapsed:?}");

        self.state
            .record_snapshot_position(&position)
            .await
            .map_err(BootstrapError::State)?;

        Ok(BootstrapReport::Completed {
            position,
            reached,
            dump_elapsed,
            parse_elapsed,
            handoff_elapsed,
            rows_seen: summary.rows_seen,
            rows_synced: stats.rows_synced,
            rows_discarded: stats.rows_discarded,
            unknown_tables: stats.unknown_tables,
            sync_failures: stats.sync_failures,
        })
    }
}
