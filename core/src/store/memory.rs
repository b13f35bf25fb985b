use std::collections::BTreeMap;
use std::sync::RwLock;

use super::TaskStore;
use crate::error::StoreError;
use crate::model::Task;

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<BTreeMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Task>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Task>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TaskStore for MemoryTaskStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.read().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.read().values().cloned().collect())
    }

    fn upsert(&self, mut task: Task) -> Result<(), StoreError> {
        task.link_contract();
        task.validate()?;
        self.write().insert(task.id.clone(), task);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<Task, StoreError> {
        self.write()
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
