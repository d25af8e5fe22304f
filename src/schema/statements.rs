//! Statement text builders
//!
//! Identifiers that end up in statement text are checked with
//! [`is_valid_identifier`]; values are always bound as `$n` placeholders.
//! Select column expressions and trailing clauses (joins, ordering) are
//! trusted fragments written by this crate and appended verbatim.

use crate::error::{Result, TrackerError};

/// Lowercase SQL identifier: letter or underscore first, then letters, digits
/// or underscores, at most 63 bytes.
pub fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

pub fn check_identifier(name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(TrackerError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

pub fn table_exists_sql() -> &'static str {
    "SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = $1"
}

/// Plain drop: the store refuses it while another table still references
/// this one.
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table)
}

/// `INSERT INTO t (a, b) VALUES ($1, $2), ($3, $4)` for `row_count` rows.
pub fn insert_sql(table: &str, columns: &[&str], row_count: usize) -> String {
    let width = columns.len();
    let tuples: Vec<String> = (0..row_count)
        .map(|row| {
            let placeholders: Vec<String> = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({})\nVALUES {}",
        table,
        columns.join(", "),
        tuples.join(",\n       ")
    )
}

/// `SELECT <columns> FROM <table>` followed by each clause on its own line.
/// An empty column list selects `*`.
pub fn select_sql(table: &str, columns: &[&str], clauses: &[&str]) -> String {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };

    let mut sql = format!("SELECT {} FROM {}", projection, table);
    for clause in clauses {
        sql.push('\n');
        sql.push_str(clause);
    }
    sql
}

/// `UPDATE t SET a = $1, b = $2 WHERE key = $3`
pub fn update_sql(table: &str, columns: &[&str], key_column: &str) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| format!("{} = ${}", column, idx + 1))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        table,
        assignments.join(", "),
        key_column,
        columns.len() + 1
    )
}

/// Name a select expression shows up under in the result row: the alias
/// after `AS`, otherwise the part after the last `.`. Unquoted names are
/// folded to lowercase the way PostgreSQL folds them; quoted names keep
/// their case.
pub fn output_name(expression: &str) -> String {
    let trimmed = expression.trim();
    let lower = trimmed.to_ascii_lowercase();

    let name = match lower.rfind(" as ") {
        Some(pos) => trimmed[pos + 4..].trim(),
        None => match trimmed.rfind('.') {
            Some(pos) => &trimmed[pos + 1..],
            None => trimmed,
        },
    };

    match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => name.to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("employee_tracker"));
        assert!(is_valid_identifier("role"));
        assert!(is_valid_identifier("_test"));

        assert!(!is_valid_identifier("")); // Empty
        assert!(!is_valid_identifier("DROP TABLE")); // SQL injection attempt
        assert!(!is_valid_identifier("1_test")); // Starts with number
        assert!(!is_valid_identifier("Employee")); // Contains uppercase
        assert!(!is_valid_identifier(&"a".repeat(64)));
    }

    #[test]
    fn test_insert_sql_numbers_placeholders_across_rows() {
        let sql = insert_sql("role", &["title", "salary", "department_id"], 2);
        assert_eq!(
            sql,
            "INSERT INTO role (title, salary, department_id)\n\
             VALUES ($1, $2, $3),\n       ($4, $5, $6)"
        );
    }

    #[test]
    fn test_select_sql() {
        assert_eq!(select_sql("department", &[], &[]), "SELECT * FROM department");

        let sql = select_sql(
            "role",
            &["role.id", "role.title", "department.name"],
            &["LEFT JOIN department ON role.department_id = department.id"],
        );
        assert_eq!(
            sql,
            "SELECT role.id, role.title, department.name FROM role\n\
             LEFT JOIN department ON role.department_id = department.id"
        );
    }

    #[test]
    fn test_update_sql() {
        assert_eq!(
            update_sql("employee", &["role_id"], "id"),
            "UPDATE employee SET role_id = $1 WHERE id = $2"
        );
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("title"), "title");
        assert_eq!(output_name("role.title"), "title");
        assert_eq!(
            output_name("manager.first_name || ' ' || manager.last_name AS manager"),
            "manager"
        );
        assert_eq!(output_name("department.name as department"), "department");
    }

    #[test]
    fn test_output_name_folds_unquoted_case() {
        assert_eq!(output_name("title AS Title"), "title");
        assert_eq!(output_name("Role.Title"), "title");
        assert_eq!(output_name("title AS \"Job Title\""), "Job Title");
        assert_eq!(output_name("role.\"Title\""), "Title");
    }
}
