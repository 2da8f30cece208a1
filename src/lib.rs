//! index-sync library
//!
//! Bootstraps a pipeline that keeps a search index in sync with MySQL: a
//! consistent `mysqldump` snapshot is replayed into the index, then the
//! snapshot's binlog position is handed to live replication.
//!
//! # Crates
//!
//! - `sync_core` - sync rules, coerced values, binlog positions
//! - `checkpoint` - persisted positions
//! - `document_sink` - the search index write seam
//! - `mysql_dump_source` - snapshot, replay and handoff
//!
//! # CLI Usage
//!
//! ```bash
//! # Bootstrap from a config file
//! index-sync bootstrap --config index-sync.toml
//!
//! # Show the position live replication would resume from
//! index-sync checkpoint show --checkpoint-dir ./var/checkpoints
//! ```

pub mod bootstrap;
pub mod position;
pub mod config;

pub use config::Config;
