use crate::error::{AppError, Result};

/// User assumed when a request names none. The service is single-tenant.
pub const DEFAULT_USER_ID: i32 = 1;

/// History window applied when `days` is absent.
pub const DEFAULT_DAYS: i64 = 30;

/// Row caps for the endpoints that have one.
pub const REVIEWS_LIMIT: i64 = 100;
pub const NOTIFICATIONS_LIMIT: i64 = 50;
pub const TOP_KEYWORDS_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string (DATABASE_URL). Checked per request, not at startup.
    pub database_url: Option<String>,
    pub log_level: String,
    pub api_port: u16,
    /// Apply migrations at startup when a database is configured (AUTO_MIGRATE)
    pub auto_migrate: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            auto_migrate: parse_flag(std::env::var("AUTO_MIGRATE").ok().as_deref(), true),
        })
    }

    /// Config pointing at the given database, everything else defaulted.
    pub fn with_database_url(url: Option<String>) -> Self {
        Self {
            database_url: url,
            log_level: "info".to_string(),
            api_port: 3000,
            auto_migrate: false,
        }
    }
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|s| s.trim().to_ascii_lowercase()) {
        Some(s) if matches!(s.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(s) if matches!(s.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
