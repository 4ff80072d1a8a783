//! Server settings: listen address, CORS origins and request body limit.
//!
//! Values are taken from the command line (or its environment variables),
//! then `config.toml`, then built-in defaults. `PORT` is honoured the way
//! hosted Node deployments of the API expect.
//!
//! ```toml
//! [listen]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [cors]
//! allowed_origins = ["http://localhost:5173"]
//!
//! [limits]
//! max_body_kib = 128
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;

/// Port used when neither `--port`, `PORT` nor the file sets one.
pub const DEFAULT_PORT: u16 = 3000;

/// Body limit used when nothing else is configured.
pub const DEFAULT_MAX_BODY_KIB: usize = 64;

/// Errors that can occur when loading server configuration.
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

    /// A CORS origin is not a valid header value.
    #[error("invalid CORS origin {0:?}")]
    InvalidOrigin(String),

    /// The body limit must allow at least one KiB.
    #[error("max body size must be at least 1 KiB")]
    ZeroBodyLimit,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    listen: ListenSection,
    cors: CorsSection,
    limits: LimitsSection,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ListenSection {
    host: Option<IpAddr>,
    port: Option<u16>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CorsSection {
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LimitsSection {
    max_body_kib: Option<usize>,
}

/// Command line for `taskman-server`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskman REST API server")]
pub struct ServerCliArgs {
    /// Interface to listen on.
    #[arg(long, env = "HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Origin allowed by CORS; repeat or comma-separate for several.
    /// Without any, every origin is allowed.
    #[arg(long = "allow-origin", env = "TASKMAN_CORS_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Largest accepted request body, in KiB.
    #[arg(long)]
    pub max_body_kib: Option<usize>,

    /// Settings file (default: `<config dir>/taskman-server/config.toml`).
    #[arg(short, long, env = "TASKMAN_SERVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info", env = "TASKMAN_SERVER_LOG")]
    pub log_level: String,
}

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsOrigins {
    /// `Access-Control-Allow-Origin: *`.
    #[default]
    Any,
    /// Only these origins are echoed back.
    List(Vec<HeaderValue>),
}

/// Settings the server runs with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub host: IpAddr,
    /// Port to listen on; `0` picks a free one.
    pub port: u16,
    /// CORS policy handed to the router.
    pub cors: CorsOrigins,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            cors: CorsOrigins::Any,
            max_body_size: DEFAULT_MAX_BODY_KIB * 1024,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads the settings file (if any) and combines it with `cli`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file is missing, the
    /// file does not parse, or a value is out of range.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => read_settings(path)?,
            None => default_settings_path()
                .map_or_else(|| Ok(None), |path| read_optional_settings(&path))?
                .unwrap_or_default(),
        };
        Self::merge(cli, file)
    }

    /// Address to bind.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    fn merge(cli: &ServerCliArgs, file: FileSettings) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let origins = if cli.allowed_origins.is_empty() {
            file.cors.allowed_origins.unwrap_or_default()
        } else {
            cli.allowed_origins.clone()
        };

        let max_body_kib = cli
            .max_body_kib
            .or(file.limits.max_body_kib)
            .unwrap_or(DEFAULT_MAX_BODY_KIB);
        if max_body_kib == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }

        Ok(Self {
            host: cli.host.or(file.listen.host).unwrap_or(defaults.host),
            port: cli.port.or(file.listen.port).unwrap_or(defaults.port),
            cors: parse_origins(&origins)?,
            max_body_size: max_body_kib.saturating_mul(1024),
            log_level: cli.log_level.clone(),
        })
    }
}

/// An empty list, or one containing `*`, allows every origin.
fn parse_origins(origins: &[String]) -> Result<CorsOrigins, ConfigError> {
    let trimmed: Vec<&str> = origins
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();
    if trimmed.is_empty() || trimmed.contains(&"*") {
        return Ok(CorsOrigins::Any);
    }
    trimmed
        .into_iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(CorsOrigins::List)
}

fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskman-server").join("config.toml"))
}

fn read_settings(path: &Path) -> Result<FileSettings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

fn read_optional_settings(path: &Path) -> Result<Option<FileSettings>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    read_settings(path).map(Some)
}
