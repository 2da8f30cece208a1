//! TOML configuration for the `bootstrap` command.
//!
//! ```toml
//! data_dir = "./var"
//! checkpoint_dir = "./var/checkpoints"
//!
//! [mysql]
//! addr = "127.0.0.1:3306"
//! user = "root"
//! password = ""
//! charset = "utf8mb4"
//!
//! [dump]
//! mysqldump = "mysqldump"
//! ignore_tables = ["shop.audit"]
//!
//! [handoff]
//! timeout = "60s"
//! on_timeout = "fail"
//!
//! [[rule]]
//! schema = "shop"
//! table = "orders"
//! columns = ["number", "float", "other"]
//! ```

mod duration;

pub use duration::parse_duration;

use anyhow::Context;
use mysql_dump_source::{HandoffTimeoutPolicy, MysqlDumper, SourceOpts, SyncOpts};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use sync_core::SyncRule;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory for the transient snapshot artifact
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where bootstrap state is persisted; in-memory when absent
    #[serde(default)]
    pub checkpoint_dir: Option<String>,

    #[serde(default)]
    pub mysql: MysqlConfig,

    #[serde(default)]
    pub dump: DumpConfig,

    #[serde(default)]
    pub handoff: HandoffConfig,

    #[serde(default, rename = "rule")]
    pub rules: Vec<SyncRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MysqlConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub charset: Option<String>,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            user: default_user(),
            password: String::new(),
            charset: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DumpConfig {
    /// Path of the mysqldump executable; empty or absent disables the dump
    #[serde(default)]
    pub mysqldump: Option<String>,
    #[serde(default)]
    pub ignore_tables: Vec<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Use `--source-data` instead of `--master-data`
    #[serde(default)]
    pub source_data: bool,
    #[serde(default = "default_true")]
    pub discard_diagnostics: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            mysqldump: None,
            ignore_tables: Vec::new(),
            extra_args: Vec::new(),
            source_data: false,
            discard_diagnostics: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandoffConfig {
    #[serde(default = "default_handoff_timeout")]
    pub timeout: String,
    #[serde(default)]
    pub on_timeout: HandoffTimeoutPolicy,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            timeout: default_handoff_timeout(),
            on_timeout: HandoffTimeoutPolicy::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./var")
}

fn default_addr() -> String {
    "127.0.0.1:3306".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

fn default_true() -> bool {
    true
}

fn default_handoff_timeout() -> String {
    "60s".to_string()
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn source_opts(&self) -> SourceOpts {
        SourceOpts {
            addr: self.mysql.addr.clone(),
            user: self.mysql.user.clone(),
            password: self.mysql.password.clone(),
            charset: self.mysql.charset.clone(),
        }
    }

    pub fn sync_opts(&self) -> anyhow::Result<SyncOpts> {
        let handoff_timeout = parse_duration(&self.handoff.timeout)
            .with_context(|| format!("Invalid handoff timeout '{}'", self.handoff.timeout))?;
        Ok(SyncOpts {
            data_dir: self.data_dir.clone(),
            handoff_timeout,
            on_handoff_timeout: self.handoff.on_timeout,
        })
    }

    /// The configured mysqldump runner, if any.
    pub fn dumper(&self) -> Option<MysqlDumper> {
        let path = self.dump.mysqldump.as_deref().filter(|p| !p.trim().is_empty())?;
        Some(
            MysqlDumper::new(path, self.source_opts())
                .with_ignore_tables(self.dump.ignore_tables.clone())
                .with_extra_args(self.dump.extra_args.clone())
                .with_source_data(self.dump.source_data)
                .with_discard_diagnostics(self.dump.discard_diagnostics),
        )
    }
}
