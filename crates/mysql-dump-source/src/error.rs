//! Bootstrap errors.

use crate::handoff::HandoffError;
use crate::parser::ParseError;

/// Fatal bootstrap failure, tagged with the phase that produced it.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to create snapshot artifact: {0}")]
    Artifact(std::io::Error),

    #[error("snapshot producer failed: {0:#}")]
    Dump(anyhow::Error),

    #[error("failed to replay snapshot: {0}")]
    Parse(ParseError),

    #[error("snapshot carries no binlog position")]
    MissingPosition,

    #[error("position handoff failed: {0}")]
    Handoff(HandoffError),

    #[error("bootstrap state error: {0:#}")]
    State(anyhow::Error),
}

impl BootstrapError {
    /// Short name of the failing phase, for logs.
    pub fn phase(&self) -> &'static str {
        match self {
            BootstrapError::Artifact(_) => "artifact",
            BootstrapError::Dump(_) => "dump",
            BootstrapError::Parse(_) | BootstrapError::MissingPosition => "parse",
            BootstrapError::Handoff(_) => "handoff",
            BootstrapError::State(_) => "state",
        }
    }
}
