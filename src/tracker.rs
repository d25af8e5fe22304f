//! Employee tracker queries
//!
//! Domain-level reads and writes over the department / role / employee
//! tables, built on the schema manager.

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::registry::{employee_tracker_registry, Registry, DEPARTMENT, EMPLOYEE, ROLE};
use crate::schema::{InsertAck, SchemaManager, TableSetupResult};
use crate::store::{PgStore, Row, Store, Value};
use rust_decimal::Decimal;
use tracing::info;

/// An id and the label shown for it in a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}

pub struct EmployeeTracker<S> {
    manager: SchemaManager<S>,
    registry: Registry,
}

impl EmployeeTracker<PgStore> {
    /// Validate the registry, connect, and select the configured database.
    pub async fn connect(config: &Config) -> Result<Self> {
        let registry = employee_tracker_registry();
        registry.validate()?;

        let manager = SchemaManager::open(config).await?;
        info!("Connection established");

        Ok(Self::new(manager, registry))
    }
}

impl<S: Store> EmployeeTracker<S> {
    pub fn new(manager: SchemaManager<S>, registry: Registry) -> Self {
        Self { manager, registry }
    }

    pub fn manager(&self) -> &SchemaManager<S> {
        &self.manager
    }

    /// Ensure every table in registry order, optionally recreating and seeding.
    pub async fn setup(&self, force_recreate: bool, seed: bool) -> Result<Vec<TableSetupResult>> {
        self.manager
            .setup_all(self.registry.tables(), force_recreate, seed)
            .await
    }

    /* ------------------------------- Reads ------------------------------- */

    pub async fn departments(&self) -> Result<Vec<Row>> {
        self.manager
            .select(
                DEPARTMENT,
                &["department.id", "department.name"],
                &["ORDER BY department.id"],
            )
            .await
    }

    pub async fn roles(&self) -> Result<Vec<Row>> {
        self.manager
            .select(
                ROLE,
                &[
                    "role.id",
                    "role.title",
                    "department.name AS department",
                    "role.salary",
                ],
                &[
                    "LEFT JOIN department ON role.department_id = department.id",
                    "ORDER BY role.id",
                ],
            )
            .await
    }

    pub async fn employees(&self) -> Result<Vec<Row>> {
        self.manager
            .select(
                EMPLOYEE,
                &[
                    "employee.id",
                    "employee.first_name",
                    "employee.last_name",
                    "role.title",
                    "department.name AS department",
                    "role.salary",
                    "manager.first_name || ' ' || manager.last_name AS manager",
                ],
                &[
                    "JOIN role ON employee.role_id = role.id",
                    "JOIN department ON role.department_id = department.id",
                    "LEFT JOIN employee AS manager ON employee.manager_id = manager.id",
                    "ORDER BY employee.id",
                ],
            )
            .await
    }

    pub async fn role_titles(&self) -> Result<Vec<String>> {
        let values = self
            .manager
            .select_column(ROLE, "role.title", &["ORDER BY role.id"])
            .await?;

        Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect())
    }

    pub async fn department_choices(&self) -> Result<Vec<Choice>> {
        let rows = self
            .manager
            .select(
                DEPARTMENT,
                &["department.id", "department.name AS label"],
                &["ORDER BY department.id"],
            )
            .await?;
        Ok(choices(&rows))
    }

    pub async fn role_choices(&self) -> Result<Vec<Choice>> {
        let rows = self
            .manager
            .select(ROLE, &["role.id", "role.title AS label"], &["ORDER BY role.id"])
            .await?;
        Ok(choices(&rows))
    }

    pub async fn employee_choices(&self) -> Result<Vec<Choice>> {
        let rows = self
            .manager
            .select(
                EMPLOYEE,
                &[
                    "employee.id",
                    "employee.first_name || ' ' || employee.last_name AS label",
                ],
                &["ORDER BY employee.id"],
            )
            .await?;
        Ok(choices(&rows))
    }

    /* ------------------------------- Writes ------------------------------ */

    pub async fn add_department(&self, name: &str) -> Result<InsertAck> {
        let name = present("department name", name)?;
        let table = self.registry.require(DEPARTMENT)?;
        let ack = self.manager.insert(table, &[vec![Value::from(name)]]).await?;
        info!("Added department {}", name);
        Ok(ack)
    }

    pub async fn add_role(&self, title: &str, salary: Decimal, department_id: i64) -> Result<InsertAck> {
        let title = present("role title", title)?;
        if salary.is_sign_negative() {
            return Err(TrackerError::InvalidInput {
                message: format!("salary must not be negative: {}", salary),
            });
        }

        let table = self.registry.require(ROLE)?;
        let row = vec![
            Value::from(title),
            Value::from(salary),
            Value::from(department_id),
        ];
        let ack = self.manager.insert(table, &[row]).await?;
        info!("Added role {}", title);
        Ok(ack)
    }

    pub async fn add_employee(
        &self,
        first_name: &str,
        last_name: &str,
        role_id: i64,
        manager_id: Option<i64>,
    ) -> Result<InsertAck> {
        let first_name = present("first name", first_name)?;
        let last_name = present("last name", last_name)?;

        let table = self.registry.require(EMPLOYEE)?;
        let row = vec![
            Value::from(first_name),
            Value::from(last_name),
            Value::from(role_id),
            Value::from(manager_id),
        ];
        let ack = self.manager.insert(table, &[row]).await?;
        info!("Added employee {} {}", first_name, last_name);
        Ok(ack)
    }

    pub async fn update_employee_role(&self, employee_id: i64, role_id: i64) -> Result<()> {
        let table = self.registry.require(EMPLOYEE)?;
        let changed = self
            .manager
            .update(
                table,
                &[("role_id", Value::from(role_id))],
                "id",
                Value::from(employee_id),
            )
            .await?;

        if changed == 0 {
            return Err(TrackerError::InvalidInput {
                message: format!("no employee with id {}", employee_id),
            });
        }

        info!("Employee {} now has role {}", employee_id, role_id);
        Ok(())
    }
}

fn present<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TrackerError::InvalidInput {
            message: format!("{} is required", field),
        })
    } else {
        Ok(trimmed)
    }
}

fn choices(rows: &[Row]) -> Vec<Choice> {
    rows.iter()
        .filter_map(|row| {
            let id = row.get("id")?.as_i64()?;
            let label = match row.get_or_null("label") {
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Some(Choice { id, label })
        })
        .collect()
}
