//! Command-line interface for index-sync
//!
//! # Usage Examples
//!
//! ## Bootstrap
//! ```bash
//! # Snapshot the tracked tables, replay them, hand off the binlog position
//! index-sync bootstrap --config index-sync.toml
//!
//! # Keep going when live replication is slow to catch up
//! index-sync bootstrap --config index-sync.toml \
//!   --handoff-timeout 5m --on-handoff-timeout proceed
//! ```
//!
//! ## Checkpoints
//! ```bash
//! index-sync checkpoint show --checkpoint-dir ./var/checkpoints
//! index-sync checkpoint set --checkpoint-dir ./var/checkpoints \
//!   --position mysql-bin.000003:154
//! ```
//!
//! ## Checkpoint Format
//! - MySQL binlog: `mysql-bin.000003:154` (binlog file + byte offset)

use clap::{Parser, Subcommand};
use index_sync::bootstrap::{run_bootstrap, BootstrapArgs};
use index_sync::position::{set_position, show_position};
use mysql_dump_source::BootstrapReport;

#[derive(Parser)]
#[command(name = "index-sync")]
#[command(about = "Bootstrap a MySQL to search index pipeline from a mysqldump snapshot")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot, replay and hand off to live replication
    Bootstrap {
        #[command(flatten)]
        args: BootstrapArgs,
    },

    /// Inspect or seed the persisted binlog position
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommand,
    },
}

#[derive(Subcommand)]
enum CheckpointCommand {
    /// Print the position the pipeline would resume from
    Show {
        /// Directory holding checkpoint files
        #[arg(long, default_value = ".index-sync-checkpoints")]
        checkpoint_dir: String,
    },

    /// Record a position so the next bootstrap skips the snapshot
    Set {
        /// Directory holding checkpoint files
        #[arg(long, default_value = ".index-sync-checkpoints")]
        checkpoint_dir: String,

        /// Binlog position as `file:offset`
        #[arg(long)]
        position: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bootstrap { args } => {
            let report = run_bootstrap(args).await?;
            print_report(&report);
        }
        Commands::Checkpoint { command } => match command {
            CheckpointCommand::Show { checkpoint_dir } => {
                match show_position(&checkpoint_dir).await? {
                    Some(position) => println!("{}:{}", position.name, position.offset),
                    None => println!("No binlog position recorded in {checkpoint_dir}"),
                }
            }
            CheckpointCommand::Set {
                checkpoint_dir,
                position,
            } => {
                let position = set_position(&checkpoint_dir, &position).await?;
                println!("Recorded binlog position {position}");
            }
        },
    }

    Ok(())
}

fn print_report(report: &BootstrapReport) {
    match report {
        BootstrapReport::Skipped(reason) => println!("Bootstrap skipped: {reason}"),
        BootstrapReport::Completed {
            position,
            reached,
            dump_elapsed,
            parse_elapsed,
            handoff_elapsed,
            rows_seen,
            rows_synced,
            rows_discarded,
            unknown_tables,
            sync_failures,
        } => {
            println!("Bootstrap completed at {position}");
            match reached {
                Some(reached) => println!("  live replication at {reached}"),
                None => println!("  live replication did not confirm the handoff"),
            }
            println!("  dump {dump_elapsed:?}, replay {parse_elapsed:?}, handoff {handoff_elapsed:?}");
            println!(
                "  {rows_seen} rows read, {rows_synced} synced, {rows_discarded} discarded, {unknown_tables} untracked, {sync_failures} failed"
            );
        }
    }
}
