//! # API Configuration Module
//!
//! Loads configuration for the gymbook API server from environment
//! variables, providing defaults where appropriate.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: Host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: Port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `MIN_NOTICE_HOURS`: Cancellation notice window in hours (default: 24)
//! - `UTC_OFFSET_HOURS`: Fixed offset applied when resolving calendar days (default: 0)
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)

use eyre::{Result, WrapErr};
use std::env;
use tracing::Level;

/// Configuration for the gymbook API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Minimum cancellation notice window, in hours
    pub min_notice_hours: i64,

    /// Fixed UTC offset applied once per request when deriving the
    /// local calendar day
    pub utc_offset_hours: i32,

    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset, or if `API_PORT`,
    /// `MIN_NOTICE_HOURS` or `UTC_OFFSET_HOURS` cannot be parsed.
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = match env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        // Booking policy settings
        let min_notice_hours = env::var("MIN_NOTICE_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .wrap_err("Invalid MIN_NOTICE_HOURS value")?;
        let utc_offset_hours = env::var("UTC_OFFSET_HOURS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .wrap_err("Invalid UTC_OFFSET_HOURS value")?;

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            min_notice_hours,
            utc_offset_hours,
            request_timeout,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080").
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
