//! Configuration module for the TeamTime backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::FixedOffset;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// HMAC secret for access tokens. A random one is generated when unset.
    pub jwt_secret: Option<String>,
    /// Access token lifetime in hours
    pub token_ttl_hours: i64,
    /// Offset of "local" time from UTC, in minutes. Drives every day boundary.
    pub utc_offset_minutes: i32,
    /// Admin account created when the user table is empty
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the first admin account.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("TEAMTIME_DB_PATH")
            .unwrap_or_else(|_| "./data/tracker.sqlite".to_string())
            .into();

        let bind_addr = env::var("TEAMTIME_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TEAMTIME_BIND_ADDR format");

        let log_level = env::var("TEAMTIME_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = env::var("TEAMTIME_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let token_ttl_hours = env::var("TEAMTIME_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "168".to_string())
            .parse()
            .expect("TEAMTIME_TOKEN_TTL_HOURS must be a valid integer");

        let utc_offset_minutes = env::var("TEAMTIME_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .expect("TEAMTIME_UTC_OFFSET_MINUTES must be a valid integer");

        let bootstrap_admin = match (
            env::var("TEAMTIME_ADMIN_EMAIL"),
            env::var("TEAMTIME_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: env::var("TEAMTIME_ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
            }),
            _ => None,
        };

        Self {
            db_path,
            bind_addr,
            log_level,
            jwt_secret,
            token_ttl_hours,
            utc_offset_minutes,
            bootstrap_admin,
        }
    }

    /// The fixed offset used as "local" time. Out-of-range values fall back to UTC.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("TEAMTIME_DB_PATH");
        env::remove_var("TEAMTIME_BIND_ADDR");
        env::remove_var("TEAMTIME_LOG_LEVEL");
        env::remove_var("TEAMTIME_JWT_SECRET");
        env::remove_var("TEAMTIME_TOKEN_TTL_HOURS");
        env::remove_var("TEAMTIME_UTC_OFFSET_MINUTES");
        env::remove_var("TEAMTIME_ADMIN_EMAIL");
        env::remove_var("TEAMTIME_ADMIN_PASSWORD");

        let config = Config::from_env();

        assert!(config.jwt_secret.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/tracker.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.utc_offset_minutes, 0);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_local_offset() {
        let mut config = Config::from_env();
        config.utc_offset_minutes = 120;
        assert_eq!(config.local_offset().local_minus_utc(), 7200);

        config.utc_offset_minutes = 100_000;
        assert_eq!(config.local_offset().local_minus_utc(), 0);
    }
}
