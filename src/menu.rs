//! Interactive menu
//!
//! Each selection runs one tracker operation. A failed operation is reported
//! and the menu comes back; only quitting (or end of input) ends the loop.

use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{Cell, ContentArrangement, Table};
use employee_tracker::store::{Row, Store, Value};
use employee_tracker::tracker::{Choice, EmployeeTracker};
use rust_decimal::Decimal;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::str::FromStr;
use tracing::{debug, error};

const PROMPT: &str = "tracker> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    ViewEmployees,
    AddEmployee,
    UpdateEmployeeRole,
    ViewRoles,
    AddRole,
    ViewDepartments,
    AddDepartment,
    Quit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 8] = [
        MenuChoice::ViewEmployees,
        MenuChoice::AddEmployee,
        MenuChoice::UpdateEmployeeRole,
        MenuChoice::ViewRoles,
        MenuChoice::AddRole,
        MenuChoice::ViewDepartments,
        MenuChoice::AddDepartment,
        MenuChoice::Quit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuChoice::ViewEmployees => "View all employees",
            MenuChoice::AddEmployee => "Add employee",
            MenuChoice::UpdateEmployeeRole => "Update employee role",
            MenuChoice::ViewRoles => "View all roles",
            MenuChoice::AddRole => "Add role",
            MenuChoice::ViewDepartments => "View all departments",
            MenuChoice::AddDepartment => "Add department",
            MenuChoice::Quit => "Quit",
        }
    }

    /// Accepts the 1-based menu number or the start of a label.
    fn parse(input: &str) -> Option<MenuChoice> {
        let input = input.trim();
        if let Ok(n) = input.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }

        let lower = input.to_ascii_lowercase();
        if lower.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|c| c.label().to_ascii_lowercase().starts_with(&lower))
    }
}

/// What a read from the terminal produced.
enum Input {
    Line(String),
    Interrupted,
    Eof,
}

pub struct Menu<S> {
    tracker: EmployeeTracker<S>,
    editor: DefaultEditor,
    format: OutputFormat,
}

impl<S: Store> Menu<S> {
    pub fn new(tracker: EmployeeTracker<S>, format: OutputFormat) -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to open terminal")?;
        Ok(Self {
            tracker,
            editor,
            format,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            println!();
            for (i, choice) in MenuChoice::ALL.iter().enumerate() {
                println!("  {}. {}", i + 1, choice.label());
            }

            let line = match self.read(PROMPT)? {
                Input::Line(line) => line,
                Input::Interrupted => continue,
                Input::Eof => break,
            };

            let choice = match MenuChoice::parse(&line) {
                Some(choice) => choice,
                None => {
                    println!("Unknown selection: {}", line.trim());
                    continue;
                }
            };

            if choice == MenuChoice::Quit {
                break;
            }

            debug!("Menu selection: {:?}", choice);
            if let Err(e) = self.handle(choice).await {
                error!("{} failed: {:#}", choice.label(), e);
                eprintln!("Error: {:#}", e);
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn handle(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::ViewEmployees => {
                let rows = self.tracker.employees().await?;
                self.print_rows(&rows)
            }
            MenuChoice::ViewRoles => {
                let rows = self.tracker.roles().await?;
                self.print_rows(&rows)
            }
            MenuChoice::ViewDepartments => {
                let rows = self.tracker.departments().await?;
                self.print_rows(&rows)
            }
            MenuChoice::AddDepartment => {
                let Some(name) = self.ask("Department name: ")? else {
                    return Ok(());
                };
                self.tracker.add_department(&name).await?;
                println!("Added department {}", name.trim());
                Ok(())
            }
            MenuChoice::AddRole => {
                let Some(title) = self.ask("Role title: ")? else {
                    return Ok(());
                };
                let Some(salary) = self.ask("Salary: ")? else {
                    return Ok(());
                };
                let salary = Decimal::from_str(salary.trim())
                    .with_context(|| format!("not a valid salary: {}", salary.trim()))?;

                let departments = self.tracker.department_choices().await?;
                let Some(Some(department_id)) = self.pick("Department", &departments, false)?
                else {
                    return Ok(());
                };

                self.tracker.add_role(&title, salary, department_id).await?;
                println!("Added role {}", title.trim());
                Ok(())
            }
            MenuChoice::AddEmployee => {
                let Some(first_name) = self.ask("First name: ")? else {
                    return Ok(());
                };
                let Some(last_name) = self.ask("Last name: ")? else {
                    return Ok(());
                };

                let roles = self.tracker.role_choices().await?;
                let Some(Some(role_id)) = self.pick("Role", &roles, false)? else {
                    return Ok(());
                };

                let employees = self.tracker.employee_choices().await?;
                let Some(manager_id) = self.pick("Manager", &employees, true)? else {
                    return Ok(());
                };

                self.tracker
                    .add_employee(&first_name, &last_name, role_id, manager_id)
                    .await?;
                println!("Added employee {} {}", first_name.trim(), last_name.trim());
                Ok(())
            }
            MenuChoice::UpdateEmployeeRole => {
                let employees = self.tracker.employee_choices().await?;
                let Some(Some(employee_id)) = self.pick("Employee", &employees, false)? else {
                    return Ok(());
                };

                let roles = self.tracker.role_choices().await?;
                let Some(Some(role_id)) = self.pick("New role", &roles, false)? else {
                    return Ok(());
                };

                self.tracker.update_employee_role(employee_id, role_id).await?;
                println!("Updated employee role");
                Ok(())
            }
            MenuChoice::Quit => Ok(()),
        }
    }

    fn read(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                Ok(Input::Interrupted)
            }
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(e).context("failed to read input"),
        }
    }

    /// Free-text answer; `None` when the user cancels.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.read(prompt)? {
            Input::Line(line) => Ok(Some(line)),
            Input::Interrupted | Input::Eof => {
                println!("Cancelled");
                Ok(None)
            }
        }
    }

    /// Numbered pick from `choices`. Outer `None` means cancelled; inner
    /// `None` means "none" was picked (only offered when `allow_none`).
    fn pick(&mut self, title: &str, choices: &[Choice], allow_none: bool) -> Result<Option<Option<i64>>> {
        if choices.is_empty() && !allow_none {
            anyhow::bail!("no {} to choose from", title.to_ascii_lowercase());
        }

        println!("{}:", title);
        if allow_none {
            println!("  0. None");
        }
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}. {}", i + 1, choice.label);
        }

        loop {
            let Some(line) = self.ask(&format!("{}> ", title.to_ascii_lowercase()))? else {
                return Ok(None);
            };

            match line.trim().parse::<usize>() {
                Ok(0) if allow_none => return Ok(Some(None)),
                Ok(n) if n >= 1 && n <= choices.len() => {
                    return Ok(Some(Some(choices[n - 1].id)));
                }
                _ => println!("Pick a number from the list"),
            }
        }
    }

    fn print_rows(&self, rows: &[Row]) -> Result<()> {
        match self.format {
            OutputFormat::Table => println!("{}", format_table(rows)),
            OutputFormat::Json => println!("{}", format_json(rows)?),
        }
        Ok(())
    }
}

fn format_table(rows: &[Row]) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    if let Some(first) = rows.first() {
        table.set_header(first.column_names().map(Cell::new));
    }

    for row in rows {
        let cells: Vec<Cell> = row
            .values()
            .map(|v| match v {
                Value::Null => Cell::new(""),
                other => Cell::new(other.to_string()),
            })
            .collect();
        table.add_row(cells);
    }

    table.to_string()
}

fn format_json(rows: &[Row]) -> Result<String> {
    let objects = rows
        .iter()
        .map(|row| -> std::result::Result<serde_json::Value, serde_json::Error> {
            let mut obj = serde_json::Map::new();
            for (name, value) in row.column_names().zip(row.values()) {
                obj.insert(name.to_string(), serde_json::to_value(value)?);
            }
            Ok(serde_json::Value::Object(obj))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(serde_json::to_string_pretty(&objects)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::ViewEmployees));
        assert_eq!(MenuChoice::parse(" 8 "), Some(MenuChoice::Quit));
        assert_eq!(MenuChoice::parse("9"), None);
        assert_eq!(MenuChoice::parse("0"), None);
        assert_eq!(MenuChoice::parse("update"), Some(MenuChoice::UpdateEmployeeRole));
        assert_eq!(MenuChoice::parse("Add d"), Some(MenuChoice::AddDepartment));
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn test_format_json() {
        let rows = vec![Row::new(vec![
            ("id".to_string(), Value::I32(1)),
            ("name".to_string(), Value::from("Sales")),
            ("manager".to_string(), Value::Null),
        ])];

        let json: serde_json::Value = serde_json::from_str(&format_json(&rows).unwrap()).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["name"], "Sales");
        assert!(json[0]["manager"].is_null());
    }

    #[test]
    fn test_format_table_has_headers() {
        let rows = vec![Row::new(vec![
            ("id".to_string(), Value::I32(1)),
            ("name".to_string(), Value::from("Sales")),
        ])];
        let rendered = format_table(&rows);
        assert!(rendered.contains("name"));
        assert!(rendered.contains("Sales"));
    }
}
