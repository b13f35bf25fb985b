//! Task persistence.

mod memory;

pub use memory::MemoryTaskStore;

use crate::error::StoreError;
use crate::model::{Task, TaskStatus};

pub trait TaskStore: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, id: &str) -> Result<Option<Task>, StoreError>;

    /// All tasks, ordered by id.
    fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Insert or replace. The task is validated first.
    fn upsert(&self, task: Task) -> Result<(), StoreError>;

    /// `NotFound` when there is no such task.
    fn delete(&self, id: &str) -> Result<Task, StoreError>;

    /// Case-insensitive match on name or description.
    fn search(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        let needle = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect())
    }

    fn by_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.status == status)
            .collect())
    }
}
