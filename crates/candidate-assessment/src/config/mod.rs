use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

use crate::access::{Role, StaffCredential};

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
    pub assessment: AssessmentConfig,
    pub access: AccessConfig,
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

        let test_window_hours = env::var("APP_TEST_WINDOW_HOURS")
            .unwrap_or_else(|_| AssessmentConfig::DEFAULT_WINDOW_HOURS.to_string())
            .parse::<u32>()
            .ok()
            .filter(|hours| *hours > 0)
            .ok_or(ConfigError::InvalidTestWindow)?;

        let staff = match env::var("APP_STAFF_TOKENS") {
            Ok(raw) => parse_staff_tokens(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assessment: AssessmentConfig { test_window_hours },
            access: AccessConfig { staff },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Rules applied to every scheduled assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentConfig {
    pub test_window_hours: u32,
}

impl AssessmentConfig {
    pub const DEFAULT_WINDOW_HOURS: u32 = 4;

    /// Length of the window between the scheduled time and the end time.
    pub fn test_window(&self) -> Duration {
        Duration::hours(i64::from(self.test_window_hours))
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            test_window_hours: Self::DEFAULT_WINDOW_HOURS,
        }
    }
}

/// Staff bearer tokens provisioned at startup.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    pub staff: Vec<StaffCredential>,
}

/// Parses `token:role:name` entries separated by commas.
fn parse_staff_tokens(raw: &str) -> Result<Vec<StaffCredential>, ConfigError> {
    let staff: Vec<StaffCredential> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':').map(str::trim);
            let token = parts.next().filter(|token| !token.is_empty());
            let role = parts.next().and_then(Role::staff_from_str);
            let name = parts.next().filter(|name| !name.is_empty());

            match (token, role, name) {
                (Some(token), Some(role), Some(name)) => Ok(StaffCredential {
                    token: token.to_string(),
                    role,
                    display_name: name.to_string(),
                }),
                _ => Err(ConfigError::InvalidStaffToken {
                    entry: entry.to_string(),
                }),
            }
        })
        .collect::<Result<_, _>>()?;

    for (index, credential) in staff.iter().enumerate() {
        if staff[..index].iter().any(|earlier| earlier.token == credential.token) {
            return Err(ConfigError::DuplicateStaffToken {
                name: credential.display_name.clone(),
            });
        }
    }

    Ok(staff)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTestWindow,
    InvalidStaffToken { entry: String },
    DuplicateStaffToken { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTestWindow => {
                write!(f, "APP_TEST_WINDOW_HOURS must be a positive whole number")
            }
            ConfigError::InvalidStaffToken { entry } => write!(
                f,
                "APP_STAFF_TOKENS entry '{}' must look like token:admin|interviewer:name",
                entry
            ),
            ConfigError::DuplicateStaffToken { name } => write!(
                f,
                "APP_STAFF_TOKENS gives '{}' a token that is already in use",
                name
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTestWindow
            | ConfigError::InvalidStaffToken { .. }
            | ConfigError::DuplicateStaffToken { .. } => None,
        }
    }
}
