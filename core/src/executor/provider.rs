use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::BackendError;
use crate::model::Task;

/// Source of generated implementations for tasks that have none yet.
#[async_trait]
pub trait CodeProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the provider has nothing for this task.
    async fn fetch(&self, task: &Task) -> Result<Option<String>, BackendError>;
}

/// Code supplied up front, keyed by task id.
#[derive(Debug, Clone, Default)]
pub struct StaticCodeProvider {
    code: HashMap<String, String>,
}

impl StaticCodeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, task_id: impl Into<String>, code: impl Into<String>) -> Self {
        self.code.insert(task_id.into(), code.into());
        self
    }

    pub fn insert(&mut self, task_id: impl Into<String>, code: impl Into<String>) {
        self.code.insert(task_id.into(), code.into());
    }
}

#[async_trait]
impl CodeProvider for StaticCodeProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, task: &Task) -> Result<Option<String>, BackendError> {
        Ok(self.code.get(&task.id).cloned())
    }
}
