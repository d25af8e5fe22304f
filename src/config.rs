use crate::error::{Result, TrackerError};
use std::env;
use std::path::PathBuf;

/// Connection settings for the tracker database.
///
/// Built from the environment (optionally loaded from `.env` first). Host,
/// user, password and database name are required; everything else has a
/// default.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Maintenance database used to create `database` when it is missing.
    pub admin_database: String,
    pub log_dir: Option<PathBuf>,
}

/// Raw settings as read from the environment, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub admin_database: Option<String>,
    pub log_dir: Option<String>,
}

impl RawConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("DB_HOST").ok(),
            port: env::var("DB_PORT").ok(),
            user: env::var("DB_USER").ok(),
            password: env::var("DB_PASSWORD").ok(),
            database: env::var("DB_NAME").ok(),
            admin_database: env::var("DB_ADMIN_NAME").ok(),
            log_dir: env::var("LOG_DIR").ok(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::validate(RawConfig::from_env())
    }

    /// Check that every required setting is present and non-empty.
    pub fn validate(raw: RawConfig) -> Result<Self> {
        let mut missing = Vec::new();

        let host = required(raw.host, "DB_HOST", &mut missing);
        let user = required(raw.user, "DB_USER", &mut missing);
        let password = required(raw.password, "DB_PASSWORD", &mut missing);
        let database = required(raw.database, "DB_NAME", &mut missing);

        if !missing.is_empty() {
            return Err(TrackerError::Configuration {
                message: format!(
                    "the following settings must be set and non-empty: {}",
                    missing.join(", ")
                ),
            });
        }

        let port = match raw.port.as_deref().map(str::trim) {
            None | Some("") => 5432,
            Some(p) => p.parse().map_err(|_| TrackerError::Configuration {
                message: format!("DB_PORT is not a valid port: {}", p),
            })?,
        };

        let admin_database = raw
            .admin_database
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "postgres".to_string());

        let log_dir = raw
            .log_dir
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            host,
            port,
            user,
            password,
            database,
            admin_database,
            log_dir,
        })
    }

    /// Connection URL for the given database on the configured server.
    pub fn database_url_for(&self, db_name: &str) -> String {
        // URL-encode credentials to handle special characters
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            db_name
        )
    }

    pub fn database_url(&self) -> String {
        self.database_url_for(&self.database)
    }

    pub fn admin_database_url(&self) -> String {
        self.database_url_for(&self.admin_database)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("admin_database", &self.admin_database)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}
