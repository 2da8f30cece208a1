//! MySQL binlog checkpoint
//!
//! Wraps a [`BinlogPosition`] so it can be persisted through the checkpoint
//! crate and passed on the command line as `file:offset`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sync_core::BinlogPosition;

/// MySQL-specific checkpoint containing a binlog position and timestamp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MySQLBinlogCheckpoint {
    /// Binlog coordinate
    pub position: BinlogPosition,
    /// Timestamp when checkpoint was created
    pub timestamp: DateTime<Utc>,
}

impl MySQLBinlogCheckpoint {
    pub fn new(position: BinlogPosition) -> Self {
        Self {
            position,
            timestamp: Utc::now(),
        }
    }
}

impl checkpoint::Checkpoint for MySQLBinlogCheckpoint {
    const DATABASE_TYPE: &'static str = "mysql-binlog";

    fn to_cli_string(&self) -> String {
        format!("{}:{}", self.position.name, self.position.offset)
    }

    fn from_cli_string(s: &str) -> Result<Self> {
        let (name, offset) = s.rsplit_once(':').ok_or_else(|| {
            anyhow::anyhow!("Invalid MySQL binlog checkpoint: expected 'file:offset', got '{s}'")
        })?;
        if name.is_empty() {
            anyhow::bail!("Invalid MySQL binlog checkpoint: empty binlog file name in '{s}'");
        }
        let offset = offset.parse::<u64>().map_err(|e| {
            anyhow::anyhow!("Invalid MySQL binlog checkpoint: bad offset in '{s}': {e}")
        })?;

        Ok(Self::new(BinlogPosition::new(name, offset)))
    }
}
