//! Configuration system for the `taskman` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskman/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use taskman_proto::task::{CreateTask, TaskPriority, TaskStatus, UpdateTask, parse_due_date};

use crate::storage::FileStorage;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    remote: RemoteFileConfig,
    storage: StorageFileConfig,
    sync: SyncFileConfig,
}

/// `[remote]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RemoteFileConfig {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
}

/// `[sync]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    probe_interval_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task API.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Directory holding the cache and queue files.
    pub data_dir: PathBuf,
    /// How often `watch` probes `/health`.
    pub probe_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(5),
            data_dir: FileStorage::default_root(),
            probe_interval: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the default file exists but is unreadable.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| file.remote.api_url.clone())
                .unwrap_or(defaults.api_url),
            request_timeout: file
                .remote
                .request_timeout_secs
                .map_or(defaults.request_timeout, whole_seconds),
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.storage.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            probe_interval: file
                .sync
                .probe_interval_secs
                .map_or(defaults.probe_interval, whole_seconds),
        }
    }
}

/// Seconds from the config file; zero is raised to one.
fn whole_seconds(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Offline-first task manager client")]
pub struct CliArgs {
    /// Base URL of the task API.
    #[arg(long, env = "TASKMAN_API_URL")]
    pub api_url: Option<String>,

    /// Path to config file (default: `~/.config/taskman/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the local cache and pending queue.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKMAN_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskman.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do. Defaults to `list`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Client subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all tasks (cached copy when offline).
    List,
    /// Show one task.
    Get {
        /// Task id.
        id: String,
    },
    /// Create a task.
    Create {
        /// Task title.
        #[arg(long)]
        title: String,
        /// Task description.
        #[arg(long)]
        description: String,
        /// Initial status (todo, in-progress, completed).
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Priority (low, medium, high).
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Due date, `YYYY-MM-DD` or RFC 3339.
        #[arg(long, value_parser = parse_due_date)]
        due: Option<DateTime<Utc>>,
    },
    /// Change fields of a task.
    Update {
        /// Task id.
        id: String,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New status.
        #[arg(long)]
        status: Option<TaskStatus>,
        /// New priority.
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// New due date, `YYYY-MM-DD` or RFC 3339.
        #[arg(long, value_parser = parse_due_date)]
        due: Option<DateTime<Utc>>,
    },
    /// Delete a task.
    Delete {
        /// Task id.
        id: String,
    },
    /// Replay queued changes against the server.
    Sync,
    /// Show queued changes.
    Pending,
    /// Show last sync time and queue length.
    Status,
    /// Erase the local cache and the queue.
    Clear,
    /// Probe the server and sync whenever it comes back, until Ctrl-C.
    Watch,
}

impl Command {
    /// The create payload, for [`Command::Create`].
    #[must_use]
    pub fn create_payload(&self) -> Option<CreateTask> {
        match self {
            Self::Create {
                title,
                description,
                status,
                priority,
                due,
            } => Some(CreateTask {
                title: title.clone(),
                description: description.clone(),
                status: *status,
                priority: *priority,
                due_date: *due,
            }),
            _ => None,
        }
    }

    /// The update payload, for [`Command::Update`].
    #[must_use]
    pub fn update_payload(&self) -> Option<UpdateTask> {
        match self {
            Self::Update {
                title,
                description,
                status,
                priority,
                due,
                ..
            } => Some(UpdateTask {
                title: title.clone(),
                description: description.clone(),
                status: *status,
                priority: *priority,
                due_date: *due,
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskman").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
