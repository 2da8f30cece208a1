//! Snapshot producers.
//!
//! The snapshot is a textual mysqldump-style artifact: one `INSERT` line per
//! row, `USE` lines switching the current database, and a `CHANGE MASTER TO`
//! line carrying the binlog position the snapshot is consistent with.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::scope::SnapshotScope;
use crate::SourceOpts;

/// Produces a consistent snapshot of `scope` into `out`.
///
/// Any error is fatal to the bootstrap run.
#[async_trait]
pub trait SnapshotProducer: Send + Sync {
    async fn dump(&self, scope: &SnapshotScope, out: std::fs::File) -> Result<()>;
}

/// Runs the `mysqldump` executable.
#[derive(Debug, Clone)]
pub struct MysqlDumper {
    path: PathBuf,
    source: SourceOpts,
    ignore_tables: Vec<String>,
    extra_args: Vec<String>,
    source_data: bool,
    discard_diagnostics: bool,
}

impl MysqlDumper {
    /// Create a dumper running the executable at `path` against `source`.
    pub fn new(path: impl Into<PathBuf>, source: SourceOpts) -> Self {
        Self {
            path: path.into(),
            source,
            ignore_tables: Vec::new(),
            extra_args: Vec::new(),
            source_data: false,
            discard_diagnostics: true,
        }
    }

    /// Tables (`db.table`) to leave out of the snapshot.
    pub fn with_ignore_tables(mut self, tables: Vec<String>) -> Self {
        self.ignore_tables = tables;
        self
    }

    /// Additional arguments appended before the scope arguments.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Use `--source-data` (MySQL 8.0.26+) instead of `--master-data`.
    pub fn with_source_data(mut self, source_data: bool) -> Self {
        self.source_data = source_data;
        self
    }

    /// Whether mysqldump's stderr is discarded (the default) or inherited.
    pub fn with_discard_diagnostics(mut self, discard: bool) -> Self {
        self.discard_diagnostics = discard;
        self
    }

    /// Command line arguments for a dump of `scope`.
    ///
    /// The password is passed through `MYSQL_PWD`, never on the command line.
    pub fn args(&self, scope: &SnapshotScope) -> Vec<String> {
        let (host, port) = self.source.host_port();
        let mut args = vec![
            format!("--host={host}"),
            format!("--port={port}"),
            format!("--user={}", self.source.user),
            if self.source_data {
                "--source-data".to_string()
            } else {
                "--master-data".to_string()
            },
            "--single-transaction".to_string(),
            "--skip-lock-tables".to_string(),
            "--compact".to_string(),
            "--skip-opt".to_string(),
            "--quick".to_string(),
            "--no-create-info".to_string(),
            "--skip-extended-insert".to_string(),
        ];

        if let Some(charset) = &self.source.charset {
            args.push(format!("--default-character-set={charset}"));
        }
        for table in &self.ignore_tables {
            args.push(format!("--ignore-table={table}"));
        }
        args.extend(self.extra_args.iter().cloned());

        match scope {
            SnapshotScope::ByTable { database, tables } => {
                args.push(database.clone());
                args.extend(tables.iter().cloned());
            }
            SnapshotScope::ByDatabase { databases } => {
                args.push("--databases".to_string());
                args.extend(databases.iter().cloned());
            }
        }

        args
    }
}

#[async_trait]
impl SnapshotProducer for MysqlDumper {
    async fn dump(&self, scope: &SnapshotScope, mut out: std::fs::File) -> Result<()> {
        // mysqldump omits the database name when dumping single tables.
        if let SnapshotScope::ByTable { database, .. } = scope {
            writeln!(out, "USE `{database}`;").context("Failed to write snapshot header")?;
        }

        let args = self.args(scope);
        debug!("Running {} {}", self.path.display(), args.join(" "));
        info!("Dumping MySQL databases {:?}", scope.databases());

        let stderr = if self.discard_diagnostics {
            Stdio::null()
        } else {
            Stdio::inherit()
        };

        let status = Command::new(&self.path)
            .args(&args)
            .env("MYSQL_PWD", &self.source.password)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(stderr)
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.path.display()))?;

        if !status.success() {
            anyhow::bail!("{} exited with {status}", self.path.display());
        }
        Ok(())
    }
}
