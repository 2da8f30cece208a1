//! DocumentSink trait definition.

use anyhow::Result;
use std::fmt;
use sync_core::{CoercedRow, SyncRule};

/// Kind of change a batch of rows represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    Insert,
    Update,
    Delete,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Insert => "insert",
            SyncAction::Update => "update",
            SyncAction::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for writing rows into the search index.
///
/// # Usage Pattern
///
/// Sources use generics for static dispatch:
///
/// ```ignore
/// pub async fn replay<S: DocumentSink>(sink: &S, rule: &SyncRule, row: CoercedRow) {
///     if let Err(e) = sink.sync_rows(rule, SyncAction::Insert, &[row], false).await {
///         tracing::error!("sync failed: {e:#}");
///     }
/// }
/// ```
///
/// Index writes are idempotent upserts keyed by the row's identity, so
/// replaying a row that live replication later applies again is harmless.
#[async_trait::async_trait]
pub trait DocumentSink: Send + Sync {
    /// Write a batch of rows belonging to `rule`.
    ///
    /// `refresh` asks the index to make the writes visible immediately.
    /// Errors are reported to the caller, who decides whether they are fatal.
    async fn sync_rows(
        &self,
        rule: &SyncRule,
        action: SyncAction,
        rows: &[CoercedRow],
        refresh: bool,
    ) -> Result<()>;
}
