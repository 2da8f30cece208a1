//! `bootstrap` command handler.
//!
//! Loads the config, fills in missing column metadata from MySQL and runs one
//! bootstrap. Writes go to a dry-run sink; a standby consumer stands in for
//! live replication and acknowledges the handed-off position.

use anyhow::Context;
use checkpoint::CheckpointStorage;
use document_sink::DryRunSink;
use mysql_dump_source::{
    collect_rule_columns, handoff_channel, BootstrapReport, BootstrapState, DumpOrchestrator,
    HandoffReceiver, HandoffTimeoutPolicy, SourceOpts,
};
use std::path::PathBuf;
use std::sync::Arc;
use sync_core::{RuleSet, SyncRule};
use tracing::{debug, error, info, warn};

use crate::Config;

#[derive(clap::Args, Clone, Debug)]
pub struct BootstrapArgs {
    /// Path of the TOML config file
    #[arg(long, env = "INDEX_SYNC_CONFIG")]
    pub config: PathBuf,

    /// Override `[handoff] timeout` (e.g. "60s", "5m")
    #[arg(long)]
    pub handoff_timeout: Option<String>,

    /// Override `[handoff] on_timeout`: "fail" or "proceed"
    #[arg(long)]
    pub on_handoff_timeout: Option<HandoffTimeoutPolicy>,
}

pub async fn run_bootstrap(args: BootstrapArgs) -> anyhow::Result<BootstrapReport> {
    let mut config = Config::from_file(&args.config)?;
    if let Some(timeout) = args.handoff_timeout {
        config.handoff.timeout = timeout;
    }
    if let Some(policy) = args.on_handoff_timeout {
        config.handoff.on_timeout = policy;
    }
    let sync_opts = config.sync_opts()?;

    let mut rules = std::mem::take(&mut config.rules);
    if rules.iter().any(SyncRule::needs_columns) {
        discover_columns(&config.source_opts(), &mut rules).await?;
    }
    let rules = RuleSet::new(rules).context("Invalid sync rules")?;

    let storage = CheckpointStorage::from_dir(config.checkpoint_dir.clone());
    if !storage.is_durable() {
        warn!("No checkpoint_dir configured, bootstrap state will not survive a restart");
    }
    let state = BootstrapState::new(storage.open());

    let sink = Arc::new(DryRunSink::new());
    let (handoff, receiver) = handoff_channel();
    let standby = tokio::spawn(standby_consumer(receiver));

    let mut orchestrator = DumpOrchestrator::new(rules, sink.clone(), state, sync_opts, handoff);
    if let Some(dumper) = config.dumper() {
        orchestrator = orchestrator.with_producer(Arc::new(dumper));
    }

    let report = match orchestrator.run().await {
        Ok(report) => report,
        Err(e) => {
            error!("Bootstrap failed in {} phase: {e}", e.phase());
            return Err(e.into());
        }
    };
    standby.await.context("Standby consumer failed")?;

    info!(
        "Sink received {} rows in {} batches",
        sink.rows(),
        sink.batches()
    );
    Ok(report)
}

/// Fill in column types of rules that declare none.
async fn discover_columns(source: &SourceOpts, rules: &mut [SyncRule]) -> anyhow::Result<()> {
    let (host, port) = source.host_port();
    let opts = mysql_async::OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(port)
        .user(Some(source.user.clone()))
        .pass(Some(source.password.clone()));

    let mut conn = mysql_async::Conn::new(opts)
        .await
        .with_context(|| format!("Failed to connect to MySQL at {}", source.addr))?;
    collect_rule_columns(&mut conn, rules).await?;
    conn.disconnect().await?;
    Ok(())
}

/// Stand-in for live replication: starts from whatever position it is handed.
async fn standby_consumer(mut receiver: HandoffReceiver) {
    match receiver.recv().await {
        Some(position) => {
            info!("Live replication would start from {position}");
            receiver.progress().report(position);
        }
        None => debug!("No snapshot position handed off"),
    }
}
