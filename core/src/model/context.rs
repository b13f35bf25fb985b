use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Runtime context of a single execution attempt.
///
/// Owned by the call that created it and dropped once its result is consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub task_id: String,
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub outputs: Map<String, Value>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub trace: Vec<String>,
    /// Snapshot of resource allocations taken when the context was built.
    #[serde(default)]
    pub resource_state: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new(task_id: impl Into<String>, inputs: Map<String, Value>) -> Self {
        Self {
            task_id: task_id.into(),
            inputs,
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn with_resource_state(mut self, resource_state: Map<String, Value>) -> Self {
        self.resource_state = resource_state;
        self
    }
}
