use std::fmt::Write as _;

use pactflow_core::model::{DataType, TaskStatus, TaskTransition, DATA_TYPE_SCHEMA_VERSION};

pub fn render_datatypes() -> String {
    let mut out = format!("data types (schema v{DATA_TYPE_SCHEMA_VERSION})\n");
    let mut categories: Vec<&str> = Vec::new();
    for dt in DataType::ALL {
        if !categories.contains(&dt.category()) {
            categories.push(dt.category());
        }
    }
    for category in categories {
        let _ = writeln!(out, "{category}:");
        for dt in DataType::ALL.iter().filter(|dt| dt.category() == category) {
            let _ = writeln!(out, "  {dt}");
        }
    }
    out
}

pub fn render_statuses() -> String {
    let mut out = String::new();
    for from in TaskStatus::ALL {
        let targets: Vec<&str> = TaskStatus::ALL
            .iter()
            .filter(|to| TaskTransition::validate(from, **to).is_ok())
            .map(|to| to.as_str())
            .collect();
        let targets = if targets.is_empty() {
            "(terminal)".to_string()
        } else {
            targets.join(", ")
        };
        let _ = writeln!(out, "{:<11} -> {}", from.as_str(), targets);
    }
    out
}
