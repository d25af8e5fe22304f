use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed to {database}: {cause}")]
    ConnectionFailed { database: String, cause: String },

    #[error("Statement failed: {statement} - {cause}")]
    StatementFailed { statement: String, cause: String },

    #[error("Invalid identifier: {name}")]
    InvalidIdentifier { name: String },

    #[error("Unknown table: {name}")]
    UnknownTable { name: String },

    #[error("Unknown column {column} on table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Value count mismatch for {table}: expected {expected} values, got {actual}")]
    ValueCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Wrap a driver error raised while running `statement`, keeping the
    /// server's message and detail when the failure came from PostgreSQL.
    pub fn statement(statement: &str, err: tokio_postgres::Error) -> Self {
        let cause = match err.as_db_error() {
            Some(db_err) => match db_err.detail() {
                Some(detail) => format!("{} - {}", db_err.message(), detail),
                None => db_err.message().to_string(),
            },
            None => err.to_string(),
        };

        TrackerError::StatementFailed {
            statement: statement.to_string(),
            cause,
        }
    }

    /// True for failures that originate from a statement the store rejected.
    pub fn is_statement_error(&self) -> bool {
        matches!(self, TrackerError::StatementFailed { .. })
    }
}

impl From<tokio_postgres::Error> for TrackerError {
    fn from(err: tokio_postgres::Error) -> Self {
        TrackerError::Internal(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for TrackerError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        TrackerError::Internal(format!("Pool error: {}", err))
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Internal(format!("IO error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
