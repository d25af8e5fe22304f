//! Schema manager
//!
//! Brings the tracker's tables into existence and serves reads and writes
//! against them.
//!
//! Setup, per table, in registry order:
//! 1. Check whether the table exists
//! 2. Drop and recreate it when forced or missing (`ensure_table`)
//! 3. Optionally insert its seed rows, batch by batch (`seed_table`)
//!
//! A forced `setup_all` first drops every given table in reverse order, so
//! referencing tables go before the tables they reference. Drops never
//! cascade: dropping a table that another table still references is
//! rejected by the store, and foreign keys are never silently removed.
//!
//! Every statement is awaited before the next is issued, so the store sees
//! them in exactly this order. A failure stops setup at that point; tables
//! already handled keep their changes.

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::registry::TableDescriptor;
use crate::schema::statements::{
    check_identifier, drop_table_sql, insert_sql, output_name, select_sql, table_exists_sql,
    update_sql,
};
use crate::store::{PgStore, Row, Store, Value};
use serde::Serialize;
use tracing::{debug, error, info};

/// Outcome of setting up one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSetupResult {
    pub table: String,
    pub existed: bool,
    pub created: bool,
    pub seeded: usize,
}

/// Acknowledgement for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertAck {
    pub rows_affected: u64,
}

pub struct SchemaManager<S> {
    store: S,
}

impl SchemaManager<PgStore> {
    /// Connect to the server and select (creating if needed) the configured
    /// database.
    pub async fn open(config: &Config) -> Result<Self> {
        let server = PgStore::connect(config).await?;
        let store = server.initialize(&config.database).await?;
        Ok(Self::new(store))
    }
}

impl<S: Store> SchemaManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True iff the current schema has a table named `name`.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let rows = self
            .store
            .query(table_exists_sql(), &[Value::from(name)])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Drop the table if present. Fails with a statement error while another
    /// table still references it.
    pub async fn drop_table(&self, name: &str) -> Result<()> {
        check_identifier(name)?;
        self.store.batch_execute(&drop_table_sql(name)).await
    }

    /// Drop then create `table` from its descriptor.
    pub async fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        check_descriptor(table)?;
        self.drop_table(&table.name).await?;
        self.store.batch_execute(&table.create_table_sql()).await?;
        info!("Created table {} in {}", table.name, self.store.database());
        Ok(())
    }

    /// Make sure `table` exists. When `force_recreate` is set, or the table is
    /// missing, it is dropped and recreated empty; otherwise an existing table
    /// is left untouched. Returns whether the table was (re)created.
    pub async fn ensure_table(&self, table: &TableDescriptor, force_recreate: bool) -> Result<bool> {
        let exists = self.table_exists(&table.name).await?;
        self.ensure_table_with(table, force_recreate, exists).await
    }

    async fn ensure_table_with(
        &self,
        table: &TableDescriptor,
        force_recreate: bool,
        exists: bool,
    ) -> Result<bool> {
        if exists && !force_recreate {
            debug!("Table {} exists, leaving it in place", table.name);
            return Ok(false);
        }

        info!("Creating {} table", table.name);
        self.create_table(table).await?;
        Ok(true)
    }

    /// Insert every seed row, one statement per row, batch order then row
    /// order. Returns the number of rows inserted.
    pub async fn seed_table(&self, table: &TableDescriptor) -> Result<usize> {
        info!("Seeding {} table", table.name);
        let mut inserted = 0;

        for batch in &table.seeds {
            for row in batch {
                self.insert(table, std::slice::from_ref(row)).await?;
                inserted += 1;
            }
        }

        debug!("Seeded {} rows into {}", inserted, table.name);
        Ok(inserted)
    }

    pub async fn setup_table(
        &self,
        table: &TableDescriptor,
        force_recreate: bool,
        seed: bool,
    ) -> Result<TableSetupResult> {
        let existed = self.table_exists(&table.name).await?;
        info!("Does {} table exist: {}", table.name, existed);
        self.setup_table_with(table, force_recreate, seed, existed).await
    }

    async fn setup_table_with(
        &self,
        table: &TableDescriptor,
        force_recreate: bool,
        seed: bool,
        existed: bool,
    ) -> Result<TableSetupResult> {
        let created = self.ensure_table_with(table, force_recreate, existed).await?;
        let seeded = if seed { self.seed_table(table).await? } else { 0 };

        Ok(TableSetupResult {
            table: table.name.clone(),
            existed,
            created,
            seeded,
        })
    }

    /// Set up each table in the order given. Referenced tables must come
    /// before the tables referencing them, or creation (and, when forced,
    /// dropping) fails in the store.
    pub async fn setup_all(
        &self,
        tables: &[TableDescriptor],
        force_recreate: bool,
        seed: bool,
    ) -> Result<Vec<TableSetupResult>> {
        let mut existed = Vec::with_capacity(tables.len());
        for table in tables {
            let exists = self.table_exists(&table.name).await?;
            info!("Does {} table exist: {}", table.name, exists);
            existed.push(exists);
        }

        if force_recreate {
            for table in tables.iter().rev() {
                self.drop_table(&table.name).await.map_err(|e| {
                    error!("Dropping table {} failed: {}", table.name, e);
                    e
                })?;
            }
        }

        let mut results = Vec::with_capacity(tables.len());
        for (table, existed) in tables.iter().zip(existed) {
            let result = self
                .setup_table_with(table, force_recreate, seed, existed)
                .await
                .map_err(|e| {
                    error!("Setup of table {} failed: {}", table.name, e);
                    e
                })?;
            results.push(result);
        }

        info!(
            "Table setup complete for {}: {} tables, {} created",
            self.store.database(),
            results.len(),
            results.iter().filter(|r| r.created).count()
        );

        Ok(results)
    }

    /// `SELECT <columns> FROM <table> <clauses...>`. An empty column list
    /// selects every column. Column expressions and clauses are used as-is.
    ///
    /// Result columns must be boolean, integer, floating point, NUMERIC or
    /// character typed (or domains over those); cast anything else to `text`.
    pub async fn select(&self, table: &str, columns: &[&str], clauses: &[&str]) -> Result<Vec<Row>> {
        check_identifier(table)?;
        let sql = select_sql(table, columns, clauses);
        let rows = self.store.query(&sql, &[]).await?;
        debug!("Selected {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    /// Select one column and return its value from each row, `Value::Null`
    /// where the row has no such field.
    pub async fn select_column(&self, table: &str, column: &str, clauses: &[&str]) -> Result<Vec<Value>> {
        let rows = self.select(table, &[column], clauses).await?;
        let field = output_name(column);
        Ok(rows.iter().map(|row| row.get_or_null(&field)).collect())
    }

    /// Insert `rows` into `table` in one statement. Each row supplies values
    /// for the table's insertable columns, in order.
    pub async fn insert(&self, table: &TableDescriptor, rows: &[Vec<Value>]) -> Result<InsertAck> {
        if rows.is_empty() {
            return Ok(InsertAck { rows_affected: 0 });
        }

        check_descriptor(table)?;
        let columns = table.insertable_columns();

        for row in rows {
            if row.len() != columns.len() {
                return Err(TrackerError::ValueCountMismatch {
                    table: table.name.clone(),
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }

        let sql = insert_sql(&table.name, &columns, rows.len());
        let params: Vec<Value> = rows.iter().flatten().cloned().collect();
        let rows_affected = self.store.execute(&sql, &params).await?;

        Ok(InsertAck { rows_affected })
    }

    /// `UPDATE <table> SET col = value, ... WHERE key_column = key_value`.
    /// Returns the number of rows changed.
    pub async fn update(
        &self,
        table: &TableDescriptor,
        assignments: &[(&str, Value)],
        key_column: &str,
        key_value: Value,
    ) -> Result<u64> {
        if assignments.is_empty() {
            return Err(TrackerError::InvalidInput {
                message: format!("update of {} has nothing to set", table.name),
            });
        }

        check_descriptor(table)?;
        for column in assignments.iter().map(|(c, _)| *c).chain(Some(key_column)) {
            if table.column(column).is_none() {
                return Err(TrackerError::UnknownColumn {
                    table: table.name.clone(),
                    column: column.to_string(),
                });
            }
        }

        let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
        let sql = update_sql(&table.name, &columns, key_column);
        let mut params: Vec<Value> = assignments.iter().map(|(_, v)| v.clone()).collect();
        params.push(key_value);

        self.store.execute(&sql, &params).await
    }
}

fn check_descriptor(table: &TableDescriptor) -> Result<()> {
    check_identifier(&table.name)?;
    for column in &table.columns {
        check_identifier(&column.name)?;
    }
    Ok(())
}
