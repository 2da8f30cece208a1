//! mysqldump-based bootstrap for index-sync
//!
//! Takes a consistent snapshot of the tracked tables with `mysqldump`,
//! replays it into the search index, and hands the snapshot's binlog position
//! to live replication so it resumes exactly where the snapshot ends.
//!
//! ```text
//! DumpOrchestrator ──► scope ──► SnapshotProducer (mysqldump) ──► artifact
//!        │                                                          │
//!        │                     parser ◄─────────────────────────────┘
//!        │                       │ per row
//!        │                       ▼
//!        │                   RowCoercer ──► RuleSet / DocumentSink
//!        ▼
//!  PositionHandoff ──► live replication consumer
//! ```

pub mod binlog;
mod coerce;
mod dumper;
mod error;
mod handoff;
mod orchestrator;
pub mod parser;
mod schema;
mod scope;
mod state;

pub use binlog::MySQLBinlogCheckpoint;
pub use coerce::{coerce_row, CoerceError, CoerceStats, RowCoercer};
pub use dumper::{MysqlDumper, SnapshotProducer};
pub use error::BootstrapError;
pub use handoff::{
    handoff_channel, HandoffError, HandoffReceiver, PositionHandoff, ProgressReporter,
    DEFAULT_HANDOFF_TIMEOUT,
};
pub use orchestrator::{BootstrapReport, DumpOrchestrator, HandoffTimeoutPolicy, SkipReason};
pub use parser::{parse_dump, DumpSummary, ParseError, RowHandler, RowOutcome};
pub use schema::{collect_rule_columns, mysql_column_type};
pub use scope::SnapshotScope;
pub use state::BootstrapState;

/// MySQL source connection options
#[derive(Clone, Debug)]
pub struct SourceOpts {
    /// MySQL address as `host:port`
    pub addr: String,
    /// MySQL user
    pub user: String,
    /// MySQL password
    pub password: String,
    /// Character set passed to mysqldump (`--default-character-set`)
    pub charset: Option<String>,
}

impl SourceOpts {
    /// Split `addr` into host and port, defaulting the port to 3306.
    pub fn host_port(&self) -> (String, u16) {
        match self.addr.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (self.addr.clone(), 3306),
            },
            None => (self.addr.clone(), 3306),
        }
    }
}

/// Sync options (non-connection related)
#[derive(Clone, Debug)]
pub struct SyncOpts {
    /// Directory holding the transient snapshot artifact
    pub data_dir: std::path::PathBuf,
    /// Maximum time to wait for live replication to reach the snapshot position
    pub handoff_timeout: std::time::Duration,
    /// What to do when that wait times out
    pub on_handoff_timeout: HandoffTimeoutPolicy,
}
