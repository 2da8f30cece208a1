//! Checkpoint storage configuration.

use std::sync::Arc;

use crate::{CheckpointStore, FilesystemStore, MemoryStore};

/// Where checkpoints are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointStorage {
    /// Keep checkpoints in memory only; nothing survives a restart.
    Memory,

    /// Write checkpoint files into `dir`.
    Filesystem { dir: String },
}

impl Default for CheckpointStorage {
    fn default() -> Self {
        CheckpointStorage::Filesystem {
            dir: ".index-sync-checkpoints".to_string(),
        }
    }
}

impl CheckpointStorage {
    /// Build storage from an optional checkpoint directory.
    pub fn from_dir(dir: Option<String>) -> Self {
        match dir {
            Some(dir) => CheckpointStorage::Filesystem { dir },
            None => CheckpointStorage::Memory,
        }
    }

    /// Open the configured backend.
    pub fn open(&self) -> Arc<dyn CheckpointStore> {
        match self {
            CheckpointStorage::Memory => Arc::new(MemoryStore::new()),
            CheckpointStorage::Filesystem { dir } => Arc::new(FilesystemStore::new(dir)),
        }
    }

    /// Whether checkpoints survive a process restart.
    pub fn is_durable(&self) -> bool {
        matches!(self, CheckpointStorage::Filesystem { .. })
    }
}
