//! Store access
//!
//! The schema manager talks to the database through the [`Store`] trait:
//! "run a statement, get rows" and "run a statement, get an acknowledgement".
//! [`PgStore`] is the PostgreSQL implementation, holding a single connection.

mod postgres;
mod value;

pub use postgres::PgStore;
pub use value::{as_params, pg_row_to_row, Row, SqlParam, Value};

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the database this store is bound to.
    fn database(&self) -> &str;

    /// Run a statement and return its rows.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement and return the number of rows it affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run one or more parameterless statements (DDL).
    async fn batch_execute(&self, sql: &str) -> Result<()>;
}
