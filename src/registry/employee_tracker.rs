//! The department / role / employee schema and its seed data.

use crate::registry::{ColumnDef, ColumnType, ForeignKey, Registry, TableDescriptor};
use crate::store::Value;
use rust_decimal::Decimal;

pub const DEPARTMENT: &str = "department";
pub const ROLE: &str = "role";
pub const EMPLOYEE: &str = "employee";

/// Registry in reference order: department, role, employee.
pub fn employee_tracker_registry() -> Registry {
    Registry::from_tables(vec![department(), role(), employee()])
}

pub fn department() -> TableDescriptor {
    TableDescriptor::new(DEPARTMENT)
        .with_column(ColumnDef::id("id"))
        .with_column(ColumnDef::new("name", ColumnType::VarChar(255)))
        .with_seed_batch(
            ["Sales", "Engineering", "Finance", "Legal"]
                .into_iter()
                .map(|name| vec![Value::from(name)])
                .collect(),
        )
}

pub fn role() -> TableDescriptor {
    let seeds: [(&str, i64, i32); 8] = [
        ("Sales Lead", 100000, 1),
        ("Salesperson", 80000, 1),
        ("Lead Engineer", 150000, 2),
        ("Software Engineer", 120000, 2),
        ("Account Manager", 160000, 3),
        ("Accountant", 125000, 3),
        ("Legal Team Lead", 250000, 4),
        ("Lawyer", 190000, 4),
    ];

    TableDescriptor::new(ROLE)
        .with_column(ColumnDef::id("id"))
        .with_column(ColumnDef::new("title", ColumnType::VarChar(255)))
        .with_column(ColumnDef::new("salary", ColumnType::Decimal))
        .with_column(ColumnDef::new("department_id", ColumnType::Integer).nullable())
        .with_foreign_key(ForeignKey::new("department_id", DEPARTMENT, "id"))
        .with_seed_batch(
            seeds
                .into_iter()
                .map(|(title, salary, department_id)| {
                    vec![
                        Value::from(title),
                        Value::from(Decimal::from(salary)),
                        Value::from(department_id),
                    ]
                })
                .collect(),
        )
}

pub fn employee() -> TableDescriptor {
    // Managers are seeded first so the second batch can reference them.
    let managers: [(&str, &str, i32); 4] = [
        ("John", "Doe", 1),
        ("Ashley", "Rodriguez", 3),
        ("Kunal", "Singh", 5),
        ("Sarah", "Lourd", 7),
    ];
    let reports: [(&str, &str, i32, i32); 4] = [
        ("Mike", "Chan", 2, 1),
        ("Kevin", "Tupik", 4, 2),
        ("Malia", "Brown", 6, 3),
        ("Tom", "Allen", 8, 4),
    ];

    TableDescriptor::new(EMPLOYEE)
        .with_column(ColumnDef::id("id"))
        .with_column(ColumnDef::new("first_name", ColumnType::VarChar(255)).nullable())
        .with_column(ColumnDef::new("last_name", ColumnType::VarChar(255)).nullable())
        .with_column(ColumnDef::new("role_id", ColumnType::Integer).nullable())
        .with_column(ColumnDef::new("manager_id", ColumnType::Integer).nullable())
        .with_foreign_key(ForeignKey::new("role_id", ROLE, "id"))
        .with_foreign_key(ForeignKey::new("manager_id", EMPLOYEE, "id"))
        .with_seed_batch(
            managers
                .into_iter()
                .map(|(first, last, role_id)| {
                    vec![
                        Value::from(first),
                        Value::from(last),
                        Value::from(role_id),
                        Value::Null,
                    ]
                })
                .collect(),
        )
        .with_seed_batch(
            reports
                .into_iter()
                .map(|(first, last, role_id, manager_id)| {
                    vec![
                        Value::from(first),
                        Value::from(last),
                        Value::from(role_id),
                        Value::from(manager_id),
                    ]
                })
                .collect(),
        )
}
