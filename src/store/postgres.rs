use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::schema::is_valid_identifier;
use crate::store::{as_params, pg_row_to_row, Row, Store, Value};
use async_trait::async_trait;
use deadpool_postgres::{Config as PoolConfig, Object, Pool, Runtime};
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;
use tracing::{debug, error, info};

/// PostgreSQL store over a single pooled connection.
///
/// The pool never grows past one connection, so every statement issued
/// through a store runs on the same session, in the order it was awaited.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    url: String,
    database: String,
}

impl PgStore {
    /// Connect to the server's maintenance database.
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.admin_database_url(), &config.admin_database).await
    }

    /// Connect using a full connection URL, e.g. for tests.
    pub async fn connect_url(database_url: &str) -> Result<Self> {
        let parsed = tokio_postgres::Config::from_str(database_url).map_err(|e| {
            TrackerError::Configuration {
                message: format!("Invalid database URL: {}", e),
            }
        })?;
        let database = parsed
            .get_dbname()
            .or(parsed.get_user())
            .unwrap_or("postgres")
            .to_string();

        Self::open(database_url, &database).await
    }

    async fn open(database_url: &str, database: &str) -> Result<Self> {
        let pool = create_pool(database_url)?;

        let client = pool.get().await.map_err(|e| {
            error!("Failed to connect to {}: {}", database, e);
            TrackerError::ConnectionFailed {
                database: database.to_string(),
                cause: e.to_string(),
            }
        })?;

        // Simple ping query
        client.execute("SELECT 1", &[]).await.map_err(|e| {
            error!("Ping to {} failed: {}", database, e);
            TrackerError::ConnectionFailed {
                database: database.to_string(),
                cause: format!("Ping failed: {}", e),
            }
        })?;

        info!("Connected to PostgreSQL database {}", database);

        Ok(Self {
            pool,
            url: database_url.to_string(),
            database: database.to_string(),
        })
    }

    /// Create `db_name` if it does not exist yet and return a store bound to it.
    ///
    /// Safe to call on every startup.
    pub async fn initialize(&self, db_name: &str) -> Result<PgStore> {
        self.create_database(db_name).await?;
        let store = Self::open(&database_url_for(&self.url, db_name)?, db_name).await?;
        info!("Using database {}", db_name);
        Ok(store)
    }

    pub async fn database_exists(&self, db_name: &str) -> Result<bool> {
        let client = self.client().await?;

        let row = client
            .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&db_name])
            .await
            .map_err(|e| TrackerError::statement("SELECT 1 FROM pg_database", e))?;

        Ok(row.is_some())
    }

    pub async fn create_database(&self, db_name: &str) -> Result<()> {
        // Can't use parameters for DDL
        if !is_valid_identifier(db_name) {
            return Err(TrackerError::InvalidIdentifier {
                name: db_name.to_string(),
            });
        }

        if self.database_exists(db_name).await? {
            debug!("Database {} already exists", db_name);
            return Ok(());
        }

        let sql = format!("CREATE DATABASE \"{}\"", db_name);
        self.batch_execute(&sql).await?;

        info!("Created database {}", db_name);
        Ok(())
    }

    async fn client(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| TrackerError::ConnectionFailed {
                database: self.database.clone(),
                cause: e.to_string(),
            })
    }
}

#[async_trait]
impl Store for PgStore {
    fn database(&self) -> &str {
        &self.database
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        debug!(database = %self.database, "query: {}", sql);
        let client = self.client().await?;
        let bound = as_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = client.query(sql, &refs).await.map_err(|e| {
            let err = TrackerError::statement(sql, e);
            error!("{}", err);
            err
        })?;

        rows.iter()
            .map(|row| {
                pg_row_to_row(row).map_err(|e| TrackerError::StatementFailed {
                    statement: sql.to_string(),
                    cause: format!("Failed to decode row: {}", e),
                })
            })
            .collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        debug!(database = %self.database, "execute: {}", sql);
        let client = self.client().await?;
        let bound = as_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        client.execute(sql, &refs).await.map_err(|e| {
            let err = TrackerError::statement(sql, e);
            error!("{}", err);
            err
        })
    }

    async fn batch_execute(&self, sql: &str) -> Result<()> {
        debug!(database = %self.database, "batch: {}", sql);
        let client = self.client().await?;

        client.batch_execute(sql).await.map_err(|e| {
            let err = TrackerError::statement(sql, e);
            error!("{}", err);
            err
        })
    }
}

/// Same server and credentials as `base_url`, different database.
fn database_url_for(base_url: &str, db_name: &str) -> Result<String> {
    let (url, query) = match base_url.split_once('?') {
        Some((url, query)) => (url, Some(query)),
        None => (base_url, None),
    };

    // Find the last '/' after the scheme and replace everything after it
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let base = match url[authority_start..].rfind('/') {
        Some(last_slash) => &url[..authority_start + last_slash + 1],
        None if authority_start > 0 => {
            return Ok(match query {
                Some(q) => format!("{}/{}?{}", url, db_name, q),
                None => format!("{}/{}", url, db_name),
            })
        }
        None => {
            return Err(TrackerError::Configuration {
                message: "Invalid database URL format".to_string(),
            })
        }
    };

    Ok(match query {
        Some(q) => format!("{}{}?{}", base, db_name, q),
        None => format!("{}{}", base, db_name),
    })
}

fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = PoolConfig::new();
    cfg.url = Some(database_url.to_string());

    cfg.pool = Some(deadpool_postgres::PoolConfig {
        max_size: 1,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(5)),
            recycle: Some(Duration::from_secs(5)),
        },
        ..Default::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| TrackerError::Internal(format!("Failed to create pool: {}", e)))
}
