//! Configuration loading and constants.
//!
//! Configuration comes from the environment, optionally seeded by a dotenv file.
//! Loading happens in two steps: [`env_snapshot`] reads the dotenv file and the
//! process environment into an immutable [`EnvSnapshot`], and
//! [`AppConfig::from_env`] turns that snapshot into an `AppConfig` without
//! touching any global state. `AppConfig` is the root configuration struct.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use const_format::formatcp;

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Bind IP address
pub const ENV_HOST: &str = "HOST";
/// Bind port
pub const ENV_PORT: &str = "PORT";
/// Display title reported by the status endpoint
pub const ENV_APP_TITLE: &str = "APP_TITLE";
/// Log output format (`text` or `json`)
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
/// Tracing filter directive
pub const ENV_LOG_FILTER: &str = "RUST_LOG";
/// Seconds to wait for in-flight connections on shutdown
pub const ENV_SHUTDOWN_TIMEOUT: &str = "SHUTDOWN_TIMEOUT_SECS";

// =============================================================================
// Defaults
// =============================================================================

/// Default bind address (all interfaces)
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default bind port
pub const DEFAULT_PORT: u16 = 8000;

/// Default display title
pub const DEFAULT_APP_TITLE: &str = "ARGOS Oracle (AI)";

/// Dotenv file read from the working directory when none is given explicitly
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Tracing target of this crate
const LOG_TARGET: &str = "argos_oracle";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=info,tower_http=info", LOG_TARGET);

/// Default graceful shutdown window in seconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Immutable view of the environment taken once at startup.
pub type EnvSnapshot = HashMap<String, String>;

/// Root configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listener configuration
    pub http: HttpServerConfig,
    /// Application identity
    pub app: AppSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// How long graceful shutdown waits for open connections
    pub shutdown_timeout: Duration,
}

impl HttpServerConfig {
    /// Socket address the listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Title shown in the status payload and startup logs
    pub title: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_APP_TITLE.to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Tracing filter directive (e.g., "argos_oracle=debug,tower_http=info")
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Build configuration from an environment snapshot.
    ///
    /// Missing or empty variables fall back to defaults. Values that are present
    /// but malformed are rejected.
    pub fn from_env(env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let defaults = HttpServerConfig::default();

        let host = parse_var(env, ENV_HOST)?.unwrap_or(defaults.host);
        let port = parse_var(env, ENV_PORT)?.unwrap_or(defaults.port);
        let shutdown_timeout = parse_var::<u64>(env, ENV_SHUTDOWN_TIMEOUT)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_timeout);

        let title = lookup(env, ENV_APP_TITLE)
            .map(str::to_string)
            .unwrap_or_else(|| AppSettings::default().title);

        let format = parse_var(env, ENV_LOG_FORMAT)?.unwrap_or_default();
        let filter = lookup(env, ENV_LOG_FILTER)
            .map(str::to_string)
            .unwrap_or_else(|| LoggingConfig::default().filter);

        Ok(Self {
            http: HttpServerConfig {
                host,
                port,
                shutdown_timeout,
            },
            app: AppSettings { title },
            logging: LoggingConfig { format, filter },
        })
    }
}

/// Non-empty, trimmed value of `key`.
fn lookup<'a>(env: &'a EnvSnapshot, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_var<T>(env: &EnvSnapshot, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(env, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                value: raw.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Take a snapshot of the environment.
///
/// Reads `env_file` (or [`DEFAULT_ENV_FILE`] when `None`) and overlays the
/// process environment on top, so variables already set in the process win
/// over the file. The process environment itself is left untouched.
///
/// The default file may be absent. An explicitly requested file must exist.
pub fn env_snapshot(env_file: Option<&Path>) -> Result<EnvSnapshot, ConfigError> {
    let file_vars = match env_file {
        Some(path) => read_env_file(path, true)?,
        None => read_env_file(Path::new(DEFAULT_ENV_FILE), false)?,
    };

    let process_vars = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));

    Ok(overlay(file_vars, process_vars))
}

/// Parse a dotenv file into key/value pairs.
///
/// Returns an empty list if the file does not exist and `required` is false.
pub fn read_env_file(path: &Path, required: bool) -> Result<Vec<(String, String)>, ConfigError> {
    let entries = match dotenv::from_path_iter(path) {
        Ok(iter) => iter,
        Err(dotenv::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "No env file found, using process environment");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Merge two variable sources; entries from `overrides` replace those in `base`.
pub fn overlay<B, O>(base: B, overrides: O) -> EnvSnapshot
where
    B: IntoIterator<Item = (String, String)>,
    O: IntoIterator<Item = (String, String)>,
{
    let mut snapshot: EnvSnapshot = base.into_iter().collect();
    snapshot.extend(overrides);
    snapshot
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
