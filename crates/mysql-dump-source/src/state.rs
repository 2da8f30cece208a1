//! Persisted bootstrap state.

use anyhow::Result;
use checkpoint::{CheckpointManager, CheckpointStore, SyncPhase};
use std::sync::Arc;
use sync_core::BinlogPosition;
use tracing::debug;

use crate::binlog::MySQLBinlogCheckpoint;

/// Last known binlog position of the pipeline.
///
/// Live replication records its progress under [`SyncPhase::Replication`];
/// a successful bootstrap records the snapshot position under
/// [`SyncPhase::SnapshotEnd`]. Either one means the pipeline can resume
/// without a new snapshot.
#[derive(Clone)]
pub struct BootstrapState {
    manager: CheckpointManager,
}

impl BootstrapState {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            manager: CheckpointManager::new(store),
        }
    }

    /// The most recent resumable position, preferring live replication
    /// progress over the snapshot position.
    pub async fn last_known_position(&self) -> Result<Option<BinlogPosition>> {
        for phase in [SyncPhase::Replication, SyncPhase::SnapshotEnd] {
            let stored = self
                .manager
                .read_checkpoint::<MySQLBinlogCheckpoint>(phase.clone())
                .await?;
            if let Some(checkpoint) = stored {
                if checkpoint.position.is_resumable() {
                    return Ok(Some(checkpoint.position));
                }
                debug!("Ignoring unusable {phase} position {}", checkpoint.position);
            }
        }
        Ok(None)
    }

    pub async fn record_snapshot_position(&self, position: &BinlogPosition) -> Result<()> {
        self.record(position, SyncPhase::SnapshotEnd).await
    }

    pub async fn record_replication_position(&self, position: &BinlogPosition) -> Result<()> {
        self.record(position, SyncPhase::Replication).await
    }

    async fn record(&self, position: &BinlogPosition, phase: SyncPhase) -> Result<()> {
        let checkpoint = MySQLBinlogCheckpoint::new(position.clone());
        self.manager.emit_checkpoint(&checkpoint, phase).await
    }
}
