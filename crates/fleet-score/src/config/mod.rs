use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::scoring::policy::{PolicyError, ScoringPolicy};
use crate::scoring::store::{ExecutionCsvImporter, ImportError, RecordSnapshot};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the scoring service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig {
                snapshot_path: optional_path("FLEET_SNAPSHOT_PATH"),
                executions_csv: optional_path("FLEET_EXECUTIONS_CSV"),
                policy_path: optional_path("FLEET_POLICY_PATH"),
            },
        })
    }
}

fn optional_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where record exports and policy overrides are read from.
#[derive(Debug, Clone, Default)]
pub struct DataConfig {
    /// JSON export holding every record collection.
    pub snapshot_path: Option<PathBuf>,
    /// CSV export of executions, appended to the snapshot's executions.
    pub executions_csv: Option<PathBuf>,
    /// JSON override for weights, windows and thresholds.
    pub policy_path: Option<PathBuf>,
}

impl DataConfig {
    /// Default policy unless an override file is configured.
    pub fn load_policy(&self) -> Result<ScoringPolicy, PolicyError> {
        match &self.policy_path {
            Some(path) => ScoringPolicy::from_path(path),
            None => Ok(ScoringPolicy::default()),
        }
    }

    /// Merge the configured exports. Missing paths yield an empty snapshot.
    pub fn load_snapshot(&self) -> Result<RecordSnapshot, ImportError> {
        let snapshot = match &self.snapshot_path {
            Some(path) => RecordSnapshot::from_path(path)?,
            None => RecordSnapshot::default(),
        };

        match &self.executions_csv {
            Some(path) => Ok(snapshot.with_executions(ExecutionCsvImporter::from_path(path)?)),
            None => Ok(snapshot),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
