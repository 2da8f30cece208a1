//! Document sink trait abstraction.
//!
//! This crate defines the `DocumentSink` trait, the seam between the
//! snapshot/binlog readers and whatever writes documents into the search
//! index. Sources hand over coerced rows tagged with the `SyncRule` they
//! belong to; the sink owns the index-specific document format.

mod dry_run;
mod traits;

pub use dry_run::DryRunSink;
pub use traits::{DocumentSink, SyncAction};
