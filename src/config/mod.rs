//! Configuration module for the school backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Configuration value that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid value {:?} for {}", self.value, self.variable)
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite document store file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Upper bound for a single store call
    pub store_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("SCHOOL_DB_PATH")
            .unwrap_or_else(|_| "./data/school.sqlite".to_string())
            .into();

        let raw_addr = env::var("SCHOOL_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let mut bind_addr: SocketAddr = raw_addr.parse().map_err(|_| ConfigError {
            variable: "SCHOOL_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        // Hosting platforms hand out the port separately
        if let Ok(port) = env::var("PORT") {
            let port = port.parse().map_err(|_| ConfigError {
                variable: "PORT",
                value: port.clone(),
            })?;
            bind_addr.set_port(port);
        }

        let log_level = env::var("SCHOOL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("SCHOOL_LOG_FORMAT") {
            Err(_) => LogFormat::Pretty,
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError {
                        variable: "SCHOOL_LOG_FORMAT",
                        value,
                    })
                }
            },
        };

        let store_timeout = match env::var("SCHOOL_STORE_TIMEOUT_MS") {
            Err(_) => Duration::from_millis(5_000),
            Ok(value) => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError {
                        variable: "SCHOOL_STORE_TIMEOUT_MS",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            store_timeout,
        })
    }
}
