//! Checkpoint file wrapper for storage-agnostic serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Checkpoint, StoredCheckpoint, SyncPhase};

/// Storage-agnostic checkpoint wrapper.
///
/// # File Format
///
/// ```json
/// {
///     "database_type": "mysql-binlog",
///     "checkpoint": { "name": "mysql-bin.000003", "offset": 154 },
///     "phase": "SnapshotEnd",
///     "created_at": "2024-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointFile {
    /// Checkpoint type identifier
    pub database_type: String,
    /// Serialized checkpoint data as JSON Value
    pub checkpoint: serde_json::Value,
    /// Sync phase when this checkpoint was created
    pub phase: SyncPhase,
    /// Timestamp when this checkpoint was created
    pub created_at: DateTime<Utc>,
}

impl CheckpointFile {
    /// Wrap a typed checkpoint.
    pub fn new<C: Checkpoint>(checkpoint: &C, phase: SyncPhase) -> anyhow::Result<Self> {
        Ok(Self {
            database_type: C::DATABASE_TYPE.to_string(),
            checkpoint: serde_json::to_value(checkpoint)?,
            phase,
            created_at: Utc::now(),
        })
    }

    /// Rebuild the wrapper from what a `CheckpointStore` returned.
    pub fn from_stored(stored: StoredCheckpoint) -> anyhow::Result<Self> {
        Ok(Self {
            database_type: stored.database_type,
            checkpoint: serde_json::from_str(&stored.checkpoint_data)?,
            phase: SyncPhase::parse(&stored.phase)?,
            created_at: stored.created_at,
        })
    }

    /// Parse checkpoint into the typed checkpoint `C`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The `database_type` doesn't match `C::DATABASE_TYPE`
    /// - The checkpoint data can't be deserialized into type `C`
    pub fn parse<C: Checkpoint>(&self) -> anyhow::Result<C> {
        if self.database_type != C::DATABASE_TYPE {
            anyhow::bail!(
                "Checkpoint type mismatch: expected '{}', found '{}'",
                C::DATABASE_TYPE,
                self.database_type
            );
        }
        Ok(serde_json::from_value(self.checkpoint.clone())?)
    }

    pub fn database_type(&self) -> &str {
        &self.database_type
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
