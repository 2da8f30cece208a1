//! Core types for the index-sync framework.
//!
//! This crate provides the foundational types shared by the dump bootstrap,
//! the document sinks and the checkpoint store:
//!
//! - [`ColumnType`] - Per-column type metadata used to coerce snapshot fields
//! - [`SyncRule`] / [`RuleSet`] - Mapping from `database.table` to a rule
//! - [`CoercedValue`] / [`CoercedRow`] - Typed values ready for indexing
//! - [`BinlogPosition`] - A `(log file, offset)` coordinate in the MySQL binlog
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── checkpoint          (persists BinlogPosition)
//!    ├─── document-sink       (receives CoercedRow batches tagged with a SyncRule)
//!    └─── mysql-dump-source   (coerces mysqldump rows, resolves rules)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{ColumnType, RuleSet, SyncRule};
//!
//! let rules = RuleSet::new(vec![SyncRule::new(
//!     "shop",
//!     "orders",
//!     vec![ColumnType::Number, ColumnType::Other],
//! )])
//! .unwrap();
//!
//! assert!(rules.resolve("shop", "orders").is_some());
//! assert!(rules.resolve("shop", "customers").is_none());
//! ```

pub mod position;
pub mod rules;
pub mod types;

// Re-exports for convenience
pub use position::BinlogPosition;
pub use rules::{rule_key, RuleError, RuleSet, SyncRule};
pub use types::{CoercedRow, CoercedValue, ColumnType};
