use serde::{Deserialize, Serialize};

use super::contract::Contract;
use super::transitions::{TaskTransition, TransitionError};
use super::types::TaskStatus;
use crate::error::ModelError;

fn default_environment() -> String {
    "python".to_string()
}

/// A unit of work: an opaque implementation behind a typed contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Estimated duration in hours on the logical clock.
    #[serde(alias = "duration")]
    pub duration_hours: u64,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub required_resources: Vec<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub contract: Contract,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    #[serde(default = "default_environment")]
    pub execution_environment: String,
}

impl Task {
    /// Build a task and check its invariants.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        duration_hours: u64,
        contract: Contract,
    ) -> Result<Self, ModelError> {
        let task = Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            duration_hours,
            dependencies: Vec::new(),
            required_resources: Vec::new(),
            status: TaskStatus::Pending,
            contract,
            generated_code: None,
            execution_environment: default_environment(),
        };
        task.validate()?;
        Ok(task)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.execution_environment = environment.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.generated_code = Some(code.into());
        self
    }

    /// Check the data-integrity invariants of a single task.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.trim().is_empty() {
            return Err(ModelError::EmptyTaskId);
        }
        if self.duration_hours == 0 {
            return Err(ModelError::InvalidDuration {
                task_id: self.id.clone(),
                duration: self.duration_hours,
            });
        }
        if self.contract.task_id != self.id {
            return Err(ModelError::ContractLinkMismatch {
                task_id: self.id.clone(),
                contract_task_id: self.contract.task_id.clone(),
            });
        }
        if self.dependencies.iter().any(|d| d == &self.id) {
            return Err(ModelError::SelfDependency(self.id.clone()));
        }
        self.contract.check_unique_names(&self.id)
    }

    /// Records loaded from files may omit the contract's task id.
    pub fn link_contract(&mut self) {
        if self.contract.task_id.trim().is_empty() {
            self.contract.task_id = self.id.clone();
        }
    }

    /// Name of the function a generated implementation must define.
    pub fn entry_point(&self) -> String {
        self.id.to_lowercase().replace('-', "_")
    }

    pub fn transition_to(&mut self, status: TaskStatus) -> Result<(), TransitionError> {
        TaskTransition::validate(self.status, status)?;
        self.status = status;
        Ok(())
    }

    /// Return a blocked task to `pending` once its failed dependency was dealt with.
    pub fn clear_block(&mut self) -> Result<(), TransitionError> {
        self.transition_to(TaskStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_duration_rejected() {
        let err = Task::new("t1", "Task", 0, Contract::new("t1")).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidDuration {
                task_id: "t1".into(),
                duration: 0
            }
        );
    }

    #[test]
    fn test_contract_must_link_to_task() {
        let err = Task::new("t1", "Task", 2, Contract::new("other")).unwrap_err();
        assert!(matches!(err, ModelError::ContractLinkMismatch { .. }));
    }

    #[test]
    fn test_entry_point_normalizes_id() {
        let task = Task::new("Build-Report", "Report", 1, Contract::new("Build-Report")).unwrap();
        assert_eq!(task.entry_point(), "build_report");
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let mut task: Task = serde_json::from_str(
            r#"{"id":"etl","name":"ETL","duration":3,"contract":{"inputs":[]}}"#,
        )
        .unwrap();
        task.link_contract();

        assert_eq!(task.duration_hours, 3);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.execution_environment, "python");
        assert_eq!(task.contract.task_id, "etl");
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_blocked_task_can_be_cleared() {
        let mut task = Task::new("t1", "Task", 1, Contract::new("t1")).unwrap();
        task.transition_to(TaskStatus::Blocked).unwrap();
        task.clear_block().unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
    }
}
