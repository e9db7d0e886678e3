use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/job_applications";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Deployment mode, selected with `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => bail!(
                "APP_ENV must be one of 'development', 'production', or 'test' (got {other})"
            ),
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    pub upload_dir: PathBuf,
    pub db_connect_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number (got '{raw}')"))?,
            None => DEFAULT_PORT,
        };

        let environment = match lookup("APP_ENV") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Development,
        };

        let timeout_secs = match lookup("DB_CONNECT_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("DB_CONNECT_TIMEOUT_SECS must be a whole number of seconds (got '{raw}')")
            })?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        Ok(Config {
            port,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            environment,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            db_connect_timeout: Duration::from_secs(timeout_secs),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.db_connect_timeout, Duration::from_secs(5));
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "8081"),
            ("DATABASE_URL", "postgres://db/apps"),
            ("APP_ENV", "prod"),
            ("UPLOAD_DIR", "/var/lib/resumes"),
            ("DB_CONNECT_TIMEOUT_SECS", "12"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.database_url, "postgres://db/apps");
        assert!(config.environment.is_production());
        assert_eq!(config.upload_dir, PathBuf::from("/var/lib/resumes"));
        assert_eq!(config.db_connect_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_rejects_invalid_port() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_rejects_unknown_environment() {
        let err = config_from(&[("APP_ENV", "staging")]).unwrap_err();
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_rejects_invalid_timeout() {
        assert!(config_from(&[("DB_CONNECT_TIMEOUT_SECS", "-1")]).is_err());
    }
}
