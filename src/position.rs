//! `checkpoint` command handlers.

use anyhow::Result;
use checkpoint::{Checkpoint, FilesystemStore};
use mysql_dump_source::{BootstrapState, MySQLBinlogCheckpoint};
use std::sync::Arc;
use sync_core::BinlogPosition;

/// Position the pipeline would resume from, read from `checkpoint_dir`.
pub async fn show_position(checkpoint_dir: &str) -> Result<Option<BinlogPosition>> {
    let state = BootstrapState::new(Arc::new(FilesystemStore::new(checkpoint_dir)));
    state.last_known_position().await
}

/// Record `position` (`file:offset`) as live replication progress so the
/// next bootstrap resumes from it instead of taking a snapshot.
pub async fn set_position(checkpoint_dir: &str, position: &str) -> Result<BinlogPosition> {
    let checkpoint = MySQLBinlogCheckpoint::from_cli_string(position)?;
    let state = BootstrapState::new(Arc::new(FilesystemStore::new(checkpoint_dir)));
    state
        .record_replication_position(&checkpoint.position)
        .await?;
    Ok(checkpoint.position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_show() {
        let dir = tempfile::TempDir::new().unwrap();
        let dir = dir.path().to_str().unwrap();

        assert_eq!(show_position(dir).await.unwrap(), None);

        let position = set_position(dir, "mysql-bin.000003:154").await.unwrap();
        assert_eq!(position, BinlogPosition::new("mysql-bin.000003", 154));
        assert_eq!(show_position(dir).await.unwrap(), Some(position));
    }

    #[tokio::test]
    async fn test_set_rejects_bad_position() {
        let dir = tempfile::TempDir::new().unwrap();
        let dir = dir.path().to_str().unwrap();
        assert!(set_position(dir, "mysql-bin.000003").await.is_err());
    }
}
