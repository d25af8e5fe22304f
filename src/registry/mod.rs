//! Schema Registry
//!
//! Static description of the tracker's tables. A [`Registry`] is built once at
//! startup and handed to the schema manager; it is never mutated afterwards.
//!
//! Registry order is creation order: a table may only reference itself or
//! tables listed before it.

mod descriptor;
mod employee_tracker;

pub use descriptor::{ColumnDef, ColumnType, ForeignKey, SeedBatch, TableDescriptor};
pub use employee_tracker::{
    department, employee, employee_tracker_registry, role, DEPARTMENT, EMPLOYEE, ROLE,
};

use crate::error::{Result, TrackerError};
use crate::schema::check_identifier;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    tables: Vec<TableDescriptor>,
}

impl Registry {
    pub fn from_tables(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    pub fn describe(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == table_name)
    }

    /// Like [`Registry::describe`], failing with `UnknownTable`.
    pub fn require(&self, table_name: &str) -> Result<&TableDescriptor> {
        self.describe(table_name)
            .ok_or_else(|| TrackerError::UnknownTable {
                name: table_name.to_string(),
            })
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Check identifiers, foreign key order and seed row widths.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for table in &self.tables {
            check_identifier(&table.name)?;

            if !seen.insert(table.name.as_str()) {
                return Err(config_error(format!("table {} is declared twice", table.name)));
            }

            for column in &table.columns {
                check_identifier(&column.name)?;
            }

            // Self references are allowed; other targets must already exist
            if let Some(missing) = table.depends_on().into_iter().find(|t| !seen.contains(t)) {
                return Err(config_error(format!(
                    "table {} references {} which is not declared before it",
                    table.name, missing
                )));
            }

            for fk in &table.foreign_keys {
                if table.column(&fk.column).is_none() {
                    return Err(config_error(format!(
                        "foreign key on {} uses unknown column {}",
                        table.name, fk.column
                    )));
                }

                let target = self.describe(&fk.references_table).ok_or_else(|| {
                    config_error(format!("unknown table {}", fk.references_table))
                })?;
                if target.column(&fk.references_column).is_none() {
                    return Err(config_error(format!(
                        "table {} references unknown column {}.{}",
                        table.name, fk.references_table, fk.references_column
                    )));
                }
            }

            let width = table.insertable_columns().len();
            for row in table.seeds.iter().flatten() {
                if row.len() != width {
                    return Err(TrackerError::ValueCountMismatch {
                        table: table.name.clone(),
                        expected: width,
                        actual: row.len(),
                    });
                }
            }

            debug!("Validated table descriptor {}", table.name);
        }

        Ok(())
    }
}

fn config_error(message: String) -> TrackerError {
    TrackerError::Configuration { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    #[test]
    fn test_describe() {
        let registry = employee_tracker_registry();
        assert_eq!(registry.describe(ROLE).unwrap().name, "role");
        assert!(registry.describe("payroll").is_none());
        assert!(matches!(
            registry.require("payroll"),
            Err(TrackerError::UnknownTable { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_forward_reference() {
        let registry = Registry::from_tables(vec![department(), employee(), role()]);
        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("employee references role"));
    }

    #[test]
    fn test_validate_rejects_bad_seed_width() {
        let table = TableDescriptor::new("department")
            .with_column(ColumnDef::id("id"))
            .with_column(ColumnDef::new("name", ColumnType::VarChar(255)))
            .with_seed_batch(vec![vec![Value::from("Sales"), Value::from("extra")]]);

        let err = Registry::from_tables(vec![table]).validate().unwrap_err();
        assert!(matches!(
            err,
            TrackerError::ValueCountMismatch { expected: 1, actual: 2, .. }
        ));
    }

    #[test]
    fn test_validate_rejects_bad_identifier() {
        let table = TableDescriptor::new("Department; DROP")
            .with_column(ColumnDef::id("id"));
        assert!(matches!(
            Registry::from_tables(vec![table]).validate(),
            Err(TrackerError::InvalidIdentifier { .. })
        ));
    }
}
