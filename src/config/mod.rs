use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::maintenance::requests::DEFAULT_MAX_ATTEMPTS;
use crate::workflows::maintenance::urgency::DEFAULT_REMINDER_MARKS;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub maintenance: MaintenanceConfig,
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

        let reminder_marks = match env::var("APP_REMINDER_DAYS") {
            Ok(raw) => parse_reminder_marks(&raw)?,
            Err(_) => DEFAULT_REMINDER_MARKS.to_vec(),
        };

        let outbox_interval_secs = env::var("APP_OUTBOX_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidOutboxInterval)?;

        let outbox_max_attempts = match env::var("APP_OUTBOX_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts > 0)
                .ok_or(ConfigError::InvalidOutboxAttempts)?,
            Err(_) => DEFAULT_MAX_ATTEMPTS,
        };

        let staff_users = env::var("APP_STAFF_USERS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let contracts_csv = optional_path("APP_CONTRACTS_CSV");
        let maintenance_types_csv = optional_path("APP_MAINTENANCE_TYPES_CSV");

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            maintenance: MaintenanceConfig {
                reminder_marks,
                outbox_interval_secs,
                outbox_max_attempts,
                staff_users,
                contracts_csv,
                maintenance_types_csv,
            },
        })
    }
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scheduling and negotiation knobs.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Days-before-due marks at which contract reminders fire.
    pub reminder_marks: Vec<i64>,
    pub outbox_interval_secs: u64,
    /// Failed deliveries allowed before a notification is dead-lettered.
    pub outbox_max_attempts: u32,
    /// Staff user ids notified about new and answered requests.
    pub staff_users: Vec<String>,
    pub contracts_csv: Option<PathBuf>,
    /// Catalog of maintenance types (name and color shown on the dashboard).
    pub maintenance_types_csv: Option<PathBuf>,
}

fn optional_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_reminder_marks(raw: &str) -> Result<Vec<i64>, ConfigError> {
    let mut marks = split_list(raw)
        .into_iter()
        .map(|value| match value.parse::<i64>() {
            Ok(days) if days >= 0 => Ok(days),
            _ => Err(ConfigError::InvalidReminderDays { value }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    marks.sort_unstable_by(|a, b| b.cmp(a));
    marks.dedup();
    Ok(marks)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidReminderDays { value: String },
    InvalidOutboxInterval,
    InvalidOutboxAttempts,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidReminderDays { value } => write!(
                f,
                "APP_REMINDER_DAYS entries must be non-negative day counts (got '{}')",
                value
            ),
            ConfigError::InvalidOutboxInterval => {
                write!(f, "APP_OUTBOX_INTERVAL_SECS must be a positive integer")
            }
            ConfigError::InvalidOutboxAttempts => {
                write!(f, "APP_OUTBOX_MAX_ATTEMPTS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidReminderDays { .. }
            | ConfigError::InvalidOutboxInterval
            | ConfigError::InvalidOutboxAttempts => None,
        }
    }
}
