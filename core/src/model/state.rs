//! Planning state: the world the scheduler, emitter and runtime operate on.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::resource::Resource;
use super::task::Task;
use super::transitions::TransitionError;
use super::types::TaskStatus;
use crate::error::ModelError;
use crate::resources::ResourceManager;

/// Serialized form of a planning state (JSON or TOML).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Extra ids to treat as completed on top of task statuses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_tasks: Vec<String>,
    #[serde(default)]
    pub current_time: u64,
}

impl StateDocument {
    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        serde_json::from_str(raw).map_err(|e| ModelError::Parse(e.to_string()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ModelError> {
        toml::from_str(raw).map_err(|e| ModelError::Parse(e.to_string()))
    }

    /// Read a document from disk; `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ModelError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&raw)
        } else {
            Self::from_json_str(&raw)
        }
    }
}

/// Tasks and resources in insertion order, plus the scheduling ledger.
#[derive(Debug, Clone, Default)]
pub struct PlanningState {
    tasks: Vec<Task>,
    task_index: HashMap<String, usize>,
    resources: Vec<Resource>,
    resource_index: HashMap<String, usize>,
    pub completed_tasks: Vec<String>,
    pub failed_tasks: Vec<String>,
    /// Logical clock in hours.
    pub current_time: u64,
    pub resource_manager: ResourceManager,
}

impl PlanningState {
    /// Build a state from tasks and resources, enforcing every integrity invariant.
    pub fn new(tasks: Vec<Task>, resources: Vec<Resource>) -> Result<Self, ModelError> {
        Self::from_document(StateDocument {
            tasks,
            resources,
            ..StateDocument::default()
        })
    }

    pub fn from_document(doc: StateDocument) -> Result<Self, ModelError> {
        let mut state = Self {
            current_time: doc.current_time,
            ..Self::default()
        };

        for resource in doc.resources {
            resource.validate()?;
            if state.resource_index.contains_key(&resource.id) {
                return Err(ModelError::DuplicateResourceId(resource.id));
            }
            state
                .resource_index
                .insert(resource.id.clone(), state.resources.len());
            state.resources.push(resource);
        }

        for mut task in doc.tasks {
            task.link_contract();
            task.validate()?;
            if state.task_index.contains_key(&task.id) {
                return Err(ModelError::DuplicateTaskId(task.id));
            }
            state.task_index.insert(task.id.clone(), state.tasks.len());
            state.tasks.push(task);
        }

        for task in &state.tasks {
            if let Some(dep) = task
                .dependencies
                .iter()
                .find(|d| !state.task_index.contains_key(*d))
            {
                return Err(ModelError::UnknownDependency {
                    task_id: task.id.clone(),
                    dependency: dep.clone(),
                });
            }
            if let Some(res) = task
                .required_resources
                .iter()
                .find(|r| !state.resource_index.contains_key(*r))
            {
                return Err(ModelError::UnknownResource {
                    task_id: task.id.clone(),
                    resource_id: res.clone(),
                });
            }
        }

        for id in &doc.completed_tasks {
            let idx = *state
                .task_index
                .get(id)
                .ok_or_else(|| ModelError::UnknownCompletedTask(id.clone()))?;
            let task = &mut state.tasks[idx];
            if !task.status.is_terminal() {
                task.status = TaskStatus::Completed;
            }
        }

        state.completed_tasks = state.ids_with_status(TaskStatus::Completed);
        state.failed_tasks = state.ids_with_status(TaskStatus::Failed);
        state.resource_manager = ResourceManager::new(state.resources.iter());

        tracing::debug!(
            tasks = state.tasks.len(),
            resources = state.resources.len(),
            completed = state.completed_tasks.len(),
            "planning state loaded"
        );
        Ok(state)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        Self::from_document(StateDocument::load(path)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        Self::from_document(StateDocument::from_json_str(raw)?)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ModelError> {
        Self::from_document(StateDocument::from_toml_str(raw)?)
    }

    pub fn to_document(&self) -> StateDocument {
        StateDocument {
            tasks: self.tasks.clone(),
            resources: self.resources.clone(),
            completed_tasks: Vec::new(),
            current_time: self.current_time,
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.task_index.get(id).map(|&i| &mut self.tasks[i])
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.task_index.contains_key(id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resource_index.get(id).map(|&i| &self.resources[i])
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed_tasks.iter().any(|c| c == id)
    }

    pub fn is_failed(&self, id: &str) -> bool {
        self.failed_tasks.iter().any(|f| f == id)
    }

    pub fn dependencies_completed(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|d| self.is_completed(d))
    }

    /// Move pending tasks with a failed dependency to `blocked`. Returns their ids.
    pub fn block_failed_dependents(&mut self) -> Vec<String> {
        let failed: HashSet<&str> = self.failed_tasks.iter().map(String::as_str).collect();
        let mut blocked = Vec::new();
        for task in &mut self.tasks {
            if task.status == TaskStatus::Pending
                && task.dependencies.iter().any(|d| failed.contains(d.as_str()))
                && task.transition_to(TaskStatus::Blocked).is_ok()
            {
                blocked.push(task.id.clone());
            }
        }
        if !blocked.is_empty() {
            tracing::warn!(?blocked, "tasks blocked by failed dependencies");
        }
        blocked
    }

    /// `in_progress -> completed` and record it in the completed list.
    pub fn mark_completed(&mut self, id: &str) -> Result<(), TransitionError> {
        if let Some(task) = self.task_mut(id) {
            task.transition_to(TaskStatus::Completed)?;
        }
        if !self.is_completed(id) {
            self.completed_tasks.push(id.to_string());
        }
        Ok(())
    }

    /// Move a task to `failed` and record it in the failed list.
    pub fn mark_failed(&mut self, id: &str) -> Result<(), TransitionError> {
        if let Some(task) = self.task_mut(id) {
            task.transition_to(TaskStatus::Failed)?;
        }
        if !self.is_failed(id) {
            self.failed_tasks.push(id.to_string());
        }
        Ok(())
    }

    pub fn ids_with_status(&self, status: TaskStatus) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.id.clone())
            .collect()
    }
}
