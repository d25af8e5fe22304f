//! Table descriptors
//!
//! A descriptor is the static shape of one table: its columns in declaration
//! order, its foreign keys, and the seed rows loaded after creation.

use crate::store::Value;
use std::fmt;

/// Column storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    VarChar(u32),
    Decimal,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::VarChar(len) => write!(f, "VARCHAR({})", len),
            ColumnType::Decimal => f.write_str("DECIMAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
}

impl ColumnDef {
    /// A NOT NULL column with no key flags.
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: false,
            auto_increment: false,
            primary_key: false,
        }
    }

    /// Auto-incrementing integer primary key.
    pub fn id(name: &str) -> Self {
        Self {
            auto_increment: true,
            primary_key: true,
            ..Self::new(name, ColumnType::Integer)
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Column text as it appears inside `CREATE TABLE`.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type);
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.auto_increment {
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }
}

/// `FOREIGN KEY (column) REFERENCES table(column) ON DELETE SET NULL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

impl ForeignKey {
    pub fn new(column: &str, references_table: &str, references_column: &str) -> Self {
        Self {
            column: column.to_string(),
            references_table: references_table.to_string(),
            references_column: references_column.to_string(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE SET NULL",
            self.column, self.references_table, self.references_column
        )
    }
}

/// One group of seed rows. Each row lines up with the insertable columns.
pub type SeedBatch = Vec<Vec<Value>>;

#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKey>,
    pub seeds: Vec<SeedBatch>,
}

impl TableDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            seeds: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.add_column(column);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn with_seed_batch(mut self, batch: SeedBatch) -> Self {
        self.seeds.push(batch);
        self
    }

    /// Replace the column with the same name in place, or append it.
    pub fn add_column(&mut self, column: ColumnDef) {
        match self.columns.iter().position(|c| c.name == column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns an insert supplies values for: every non auto-increment
    /// column, in declaration order.
    pub fn insertable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.auto_increment)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn seed_row_count(&self) -> usize {
        self.seeds.iter().map(Vec::len).sum()
    }

    /// Tables this table references, excluding itself, each listed once in
    /// foreign key order.
    pub fn depends_on(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for fk in &self.foreign_keys {
            let target = fk.references_table.as_str();
            if target != self.name && !deps.contains(&target) {
                deps.push(target);
            }
        }
        deps
    }

    /// `CREATE TABLE` statement: columns then foreign keys, joined with
    /// `,\n  ` in declaration order.
    pub fn create_table_sql(&self) -> String {
        let definitions: Vec<String> = self
            .columns
            .iter()
            .map(ColumnDef::to_sql)
            .chain(self.foreign_keys.iter().map(ForeignKey::to_sql))
            .collect();

        format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.name,
            definitions.join(",\n  ")
        )
    }
}
