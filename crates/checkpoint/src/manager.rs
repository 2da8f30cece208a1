//! Generic manager for checkpoint operations.

use std::sync::Arc;

use crate::{store::CheckpointStore, Checkpoint, CheckpointFile, CheckpointID, SyncPhase};

/// Saves and loads typed checkpoints through a `CheckpointStore`.
///
/// # Example
///
/// ```rust,ignore
/// use checkpoint::{CheckpointManager, MemoryStore, SyncPhase};
///
/// let manager = CheckpointManager::new(Arc::new(MemoryStore::new()));
/// manager.emit_checkpoint(&checkpoint, SyncPhase::SnapshotEnd).await?;
/// let loaded: Option<MySQLBinlogCheckpoint> = manager.read_checkpoint(SyncPhase::SnapshotEnd).await?;
/// ```
#[derive(Clone)]
pub struct CheckpointManager {
    store: Arc<dyn CheckpointStore>,
}

impl CheckpointManager {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    fn id_for<C: Checkpoint>(phase: &SyncPhase) -> CheckpointID {
        CheckpointID {
            database_type: C::DATABASE_TYPE.to_string(),
            phase: phase.as_str().to_string(),
        }
    }

    /// Persist a checkpoint for `phase`, replacing the previous one.
    pub async fn emit_checkpoint<C: Checkpoint>(
        &self,
        checkpoint: &C,
        phase: SyncPhase,
    ) -> anyhow::Result<()> {
        let file = CheckpointFile::new(checkpoint, phase.clone())?;
        let id = Self::id_for::<C>(&phase);
        self.store
            .store_checkpoint(&id, serde_json::to_string(&file.checkpoint)?)
            .await?;

        tracing::info!("Emitted {} checkpoint: {}", phase, checkpoint.to_cli_string());
        Ok(())
    }

    /// Load the checkpoint for `phase`, if one was ever stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored checkpoint has a
    /// different type than `C`.
    pub async fn read_checkpoint<C: Checkpoint>(
        &self,
        phase: SyncPhase,
    ) -> anyhow::Result<Option<C>> {
        let id = Self::id_for::<C>(&phase);
        match self.store.read_checkpoint(&id).await? {
            Some(stored) => {
                let file = CheckpointFile::from_stored(stored)?;
                Ok(Some(file.parse::<C>()?))
            }
            None => Ok(None),
        }
    }
}
