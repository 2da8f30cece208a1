//! Sink that only logs what it would write.

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use sync_core::{CoercedRow, SyncRule};
use tracing::debug;

use crate::{DocumentSink, SyncAction};

/// Dry run mode: count and log rows instead of writing them.
#[derive(Debug, Default)]
pub struct DryRunSink {
    rows: AtomicU64,
    batches: AtomicU64,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows accepted so far.
    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    /// Batches accepted so far.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl DocumentSink for DryRunSink {
    async fn sync_rows(
        &self,
        rule: &SyncRule,
        action: SyncAction,
        rows: &[CoercedRow],
        _refresh: bool,
    ) -> Result<()> {
        for row in rows {
            debug!("[dry-run] {} {}: {:?}", action, rule.key(), row);
        }
        self.rows.fetch_add(rows.len() as u64, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{CoercedValue, ColumnType};

    #[tokio::test]
    async fn test_dry_run_counts_rows_and_batches() {
        let sink = DryRunSink::new();
        let rule = SyncRule::new("shop", "orders", vec![ColumnType::Number]);

        sink.sync_rows(
            &rule,
            SyncAction::Insert,
            &[vec![CoercedValue::Int64(1)], vec![CoercedValue::Int64(2)]],
            false,
        )
        .await
        .unwrap();
        sink.sync_rows(&rule, SyncAction::Delete, &[vec![CoercedValue::Int64(1)]], true)
            .await
            .unwrap();

        assert_eq!(sink.rows(), 3);
        assert_eq!(sink.batches(), 2);
    }

    #[test]
    fn test_sync_action_display() {
        assert_eq!(SyncAction::Insert.to_string(), "insert");
        assert_eq!(SyncAction::Update.to_string(), "update");
        assert_eq!(SyncAction::Delete.to_string(), "delete");
    }
}
