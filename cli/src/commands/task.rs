//! Task store commands.
use std::fmt::Write as _;

use pactflow_core::config::AppConfig;
use pactflow_core::error::CliError;
use pactflow_core::model::{StateDocument, Task, TaskStatus};
use pactflow_core::store::TaskStore;
use pactflow_plugins::factory;

use crate::commands::cli::{TaskArgs, TaskCommand};
use crate::utils::print_json;

pub fn open_store(cfg: &AppConfig, store: Option<&str>) -> Result<Box<dyn TaskStore>, CliError> {
    let mut cfg = cfg.clone();
    if let Some(path) = store {
        cfg.store.path = path.to_string();
    }
    Ok(factory::build_store(&cfg)?)
}

pub fn handle_task(args: TaskArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let store = open_store(cfg, args.store.as_deref())?;

    match args.command {
        TaskCommand::List { status, search } => {
            let mut tasks = match search.as_deref() {
                Some(q) => store.search(q)?,
                None => store.list()?,
            };
            if let Some(raw) = status.as_deref() {
                let status: TaskStatus = raw
                    .parse()
                    .map_err(|_| CliError::Command(format!("unknown status: {raw}")))?;
                tasks.retain(|t| t.status == status);
            }
            print!("{}", render_task_table(&tasks));
        }
        TaskCommand::Show { id } => {
            let task = store
                .get(&id)?
                .ok_or_else(|| CliError::Command(format!("task not found: {id}")))?;
            print_json(&task)?;
        }
        TaskCommand::Delete { id } => {
            let removed = store.delete(&id)?;
            println!("deleted {}", removed.id);
        }
        TaskCommand::Import { file } => {
            let doc = StateDocument::load(&file)?;
            let count = doc.tasks.len();
            for task in doc.tasks {
                store.upsert(task)?;
            }
            println!("imported {count} task(s) into {}", store.name());
        }
    }
    Ok(0)
}

pub fn render_task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "no tasks\n".to_string();
    }
    let width = tasks.iter().map(|t| t.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for t in tasks {
        let _ = writeln!(
            out,
            "{:<width$}  {:<11}  {:>3}h  {}",
            t.id,
            t.status.as_str(),
            t.duration_hours,
            t.name,
            width = width
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactflow_core::model::Contract;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_table_aligns_ids() {
        let tasks = vec![
            Task::new("a", "Alpha", 2, Contract::new("a")).unwrap(),
            Task::new("long_id", "Beta", 12, Contract::new("long_id")).unwrap(),
        ];
        assert_eq!(
            render_task_table(&tasks),
            "a        pending        2h  Alpha\nlong_id  pending       12h  Beta\n"
        );
        assert_eq!(render_task_table(&[]), "no tasks\n");
    }

    #[test]
    fn test_import_then_show_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tasks.json");
        let state_path = dir.path().join("state.json");
        std::fs::write(
            &state_path,
            r#"{"tasks": [{"id": "t1", "name": "One", "duration": 3}]}"#,
        )
        .unwrap();

        let cfg = AppConfig::default();
        let store_arg = store_path.to_string_lossy().into_owned();
        let code = handle_task(
            TaskArgs {
                store: Some(store_arg.clone()),
                command: TaskCommand::Import { file: state_path },
            },
            &cfg,
        )
        .unwrap();
        assert_eq!(code, 0);

        let store = open_store(&cfg, Some(&store_arg)).unwrap();
        let task = store.get("t1").unwrap().unwrap();
        assert_eq!(task.duration_hours, 3);
        assert_eq!(task.contract.task_id, "t1");
    }
}
