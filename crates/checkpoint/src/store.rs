//! Checkpoint storage trait and types
//!
//! This module defines the CheckpointStore trait for backend-agnostic
//! checkpoint storage operations, plus shared types.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checkpoint identifier for storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointID {
    /// Checkpoint type (e.g., "mysql-binlog")
    pub database_type: String,
    /// Sync phase ("snapshot_end" or "replication")
    pub phase: String,
}

impl CheckpointID {
    /// Stable storage name for this id, e.g. `mysql-binlog_snapshot_end`.
    pub fn storage_name(&self) -> String {
        format!("{}_{}", self.database_type, self.phase)
    }
}

/// Checkpoint data stored in backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCheckpoint {
    /// Serialized checkpoint (e.g. a binlog position as JSON)
    pub checkpoint_data: String,
    /// Checkpoint type for validation
    pub database_type: String,
    /// Sync phase for validation
    pub phase: String,
    /// Timestamp when checkpoint was created
    pub created_at: DateTime<Utc>,
}

/// Trait for checkpoint storage operations.
///
/// This trait abstracts the storage backend so the same checkpoint logic
/// works with:
/// - Filesystem storage (`FilesystemStore`)
/// - In-memory storage (`MemoryStore`)
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store a checkpoint, replacing any previous one with the same id.
    async fn store_checkpoint(&self, id: &CheckpointID, checkpoint_data: String) -> Result<()>;

    /// Read a checkpoint from the storage backend.
    ///
    /// Returns None if the checkpoint doesn't exist.
    async fn read_checkpoint(&self, id: &CheckpointID) -> Result<Option<StoredCheckpoint>>;
}
