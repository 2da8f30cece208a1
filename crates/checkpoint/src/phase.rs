//! Sync phase enumeration for checkpoint tracking.

use serde::{Deserialize, Serialize};

/// The point in the sync lifecycle a checkpoint was taken at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncPhase {
    /// Position the snapshot was consistent with, written once the snapshot
    /// has been replayed and live replication has caught up to it.
    SnapshotEnd,

    /// Progress of live replication, written by the binlog consumer as it
    /// applies events. Takes precedence over `SnapshotEnd` when resuming.
    Replication,
}

impl SyncPhase {
    /// Get the string representation of this phase.
    ///
    /// Used for checkpoint file naming (e.g., `mysql-binlog_snapshot_end.json`)
    /// and logging.
    pub fn as_str(&self) -> &str {
        match self {
            SyncPhase::SnapshotEnd => "snapshot_end",
            SyncPhase::Replication => "replication",
        }
    }

    /// Parse a phase string as produced by [`SyncPhase::as_str`].
    pub fn parse(phase: &str) -> anyhow::Result<Self> {
        match phase {
            "snapshot_end" => Ok(SyncPhase::SnapshotEnd),
            "replication" => Ok(SyncPhase::Replication),
            other => Err(anyhow::anyhow!("Unknown sync phase: {other}")),
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
