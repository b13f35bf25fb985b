use pactflow_core::error::StoreError;
use pactflow_core::model::Task;
use pactflow_core::store::TaskStore;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Task store persisted as one pretty-printed JSON object (`id -> task`).
///
/// Every mutation rewrites the whole file through a temp file in the same
/// directory, so a crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct JsonFileTaskStore {
    path: PathBuf,
    tasks: RwLock<BTreeMap<String, Task>>,
}

impl JsonFileTaskStore {
    /// 打开存储；文件不存在时视为空存储
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
        let path = PathBuf::from(expanded);

        let tasks = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                let mut tasks: BTreeMap<String, Task> = serde_json::from_str(&raw)?;
                for (id, task) in tasks.iter_mut() {
                    if *id != task.id {
                        return Err(StoreError::Serde(format!(
                            "record key '{id}' does not match task id '{}'",
                            task.id
                        )));
                    }
                    task.link_contract();
                    task.validate()?;
                }
                tasks
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), tasks = tasks.len(), "task store opened");
        Ok(Self {
            path,
            tasks: RwLock::new(tasks),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Task>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Task>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, tasks: &BTreeMap<String, Task>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let body = serde_json::to_string_pretty(tasks)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl TaskStore for JsonFileTaskStore {
    fn name(&self) -> &str {
        "json-file"
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

        let mut tasks = self.write();
        let previous = tasks.insert(task.id.clone(), task.clone());
        if let Err(e) = self.persist(&tasks) {
            match previous {
                Some(old) => tasks.insert(task.id.clone(), old),
                None => tasks.remove(&task.id),
            };
            return Err(e);
        }
        tracing::info!(task_id = %task.id, "task saved");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<Task, StoreError> {
        let mut tasks = self.write();
        let removed = tasks
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Err(e) = self.persist(&tasks) {
            tasks.insert(id.to_string(), removed);
            return Err(e);
        }
        tracing::info!(task_id = %id, "task deleted");
        Ok(removed)
    }
}
