//! Checkpoint management for index-sync
//!
//! Provides storage-agnostic checkpoint handling for replication positions.
//!
//! # Architecture
//!
//! - The `Checkpoint` trait describes a position type (e.g. a binlog coordinate)
//! - `CheckpointFile` wraps a checkpoint with metadata for serialization
//! - `CheckpointManager` saves and loads checkpoints per `SyncPhase`
//! - `CheckpointStore` abstracts the storage backend
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - One JSON file per checkpoint id, replaced atomically
//! - `MemoryStore` - Process-lifetime storage for tests and ephemeral runs

mod config;
mod file;
mod filesystem;
mod manager;
mod memory;
mod phase;
pub mod store;


// Re-export config types
pub use config::CheckpointStorage;

// Re-export file types
pub use file::CheckpointFile;

// Re-export manager types
pub use manager::CheckpointManager;

// Re-export phase types
pub use phase::SyncPhase;

// Re-export store trait and types
pub use store::{CheckpointID, CheckpointStore, StoredCheckpoint};

// Re-export storage implementations
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

/// Trait that position-like checkpoints must implement.
///
/// # Example
///
/// ```rust
/// use checkpoint::Checkpoint;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct SequenceCheckpoint {
///     pub sequence: i64,
/// }
///
/// impl Checkpoint for SequenceCheckpoint {
///     const DATABASE_TYPE: &'static str = "sequence";
///
///     fn to_cli_string(&self) -> String {
///         self.sequence.to_string()
///     }
///
///     fn from_cli_string(s: &str) -> anyhow::Result<Self> {
///         Ok(Self { sequence: s.parse()? })
///     }
/// }
/// ```
pub trait Checkpoint: serde::Serialize + for<'de> serde::Deserialize<'de> + Clone {
    /// Checkpoint type identifier (e.g., "mysql-binlog").
    ///
    /// Stored alongside the checkpoint and validated on load.
    const DATABASE_TYPE: &'static str;

    /// Convert to CLI-friendly string format.
    ///
    /// The returned string should be parseable by `from_cli_string()`.
    fn to_cli_string(&self) -> String;

    /// Parse from CLI string format.
    fn from_cli_string(s: &str) -> anyhow::Result<Self>
    where
        Self: Sized;
}
