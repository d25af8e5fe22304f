//! Employee Tracker Library
//!
//! Table descriptors, schema bootstrap and CRUD operations for a small
//! PostgreSQL schema of departments, roles and employees.

pub mod config;
pub mod error;
pub mod registry;
pub mod schema;
pub mod store;
pub mod tracker;

pub use error::{Result, TrackerError};
