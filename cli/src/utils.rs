use pactflow_core::error::CliError;
use pactflow_core::model::PlanningState;
use pactflow_core::runtime::TaskInputs;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// 接受内联 JSON 对象，或指向 JSON 文件的路径
pub fn read_json_object(arg: &str) -> Result<Map<String, Value>, CliError> {
    let trimmed = arg.trim();
    let raw = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let path = shellexpand::tilde(trimmed).into_owned();
        std::fs::read_to_string(&path)
            .map_err(|e| CliError::Command(format!("failed to read {path}: {e}")))?
    };
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::Command(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

pub fn read_optional_object(arg: Option<&str>) -> Result<Map<String, Value>, CliError> {
    arg.map(read_json_object)
        .transpose()
        .map(Option::unwrap_or_default)
}

/// `{ "task_id": { ...inputs } }` into per-task input maps.
pub fn read_task_inputs(arg: Option<&str>) -> Result<TaskInputs, CliError> {
    let mut inputs = TaskInputs::new();
    for (task_id, value) in read_optional_object(arg)? {
        match value {
            Value::Object(map) => {
                inputs.insert(task_id, map);
            }
            other => {
                return Err(CliError::Command(format!(
                    "inputs for task {task_id} must be an object, got {}",
                    kind_of(&other)
                )))
            }
        }
    }
    Ok(inputs)
}

pub fn load_state(path: &Path) -> Result<PlanningState, CliError> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let state = PlanningState::load(Path::new(&expanded))?;
    tracing::debug!(path = %expanded, tasks = state.task_count(), "state loaded");
    Ok(state)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_inline_and_file_objects() {
        let inline = read_json_object(r#"{"user_id": 7}"#).unwrap();
        assert_eq!(inline["user_id"], json!(7));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.json");
        std::fs::write(&path, r#"{"a": [1, 2]}"#).unwrap();
        let from_file = read_json_object(path.to_str().unwrap()).unwrap();
        assert_eq!(from_file["a"], json!([1, 2]));
    }

    #[test]
    fn test_non_object_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1]").unwrap();
        let err = read_json_object(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "command failed: expected a JSON object, got array");
    }

    #[test]
    fn test_task_inputs_require_objects() {
        let inputs = read_task_inputs(Some(r#"{"a": {"x": 1}}"#)).unwrap();
        assert_eq!(inputs["a"]["x"], json!(1));
        assert!(read_task_inputs(Some(r#"{"a": 3}"#)).is_err());
        assert!(read_task_inputs(None).unwrap().is_empty());
    }
}
