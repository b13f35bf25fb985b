use async_trait::async_trait;
use pactflow_core::error::BackendError;
use pactflow_core::executor::CodeProvider;
use pactflow_core::model::Task;
use std::path::{Path, PathBuf};

/// Reads implementations from `<dir>/<task_id>.<ext>`.
///
/// When several files match, the one whose extension matches the task's
/// environment interpreter wins, then the first in path order.
#[derive(Debug, Clone)]
pub struct FileCodeProvider {
    dir: PathBuf,
    preferred_extensions: Vec<(String, String)>,
}

impl FileCodeProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let expanded = shellexpand::tilde(&dir.as_ref().to_string_lossy()).into_owned();
        Self {
            dir: PathBuf::from(expanded),
            preferred_extensions: Vec::new(),
        }
    }

    /// environment tag -> extension to prefer for that environment
    pub fn with_extension(mut self, environment: impl Into<String>, ext: impl Into<String>) -> Self {
        self.preferred_extensions.push((environment.into(), ext.into()));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, task_id: &str) -> Result<Vec<PathBuf>, BackendError> {
        let pattern = format!(
            "{}/{}.*",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            glob::Pattern::escape(task_id)
        );
        let paths = glob::glob(&pattern)
            .map_err(|e| BackendError::Provider(format!("bad pattern {pattern}: {e}")))?;
        let mut found: Vec<PathBuf> = paths.filter_map(Result::ok).filter(|p| p.is_file()).collect();
        found.sort();
        Ok(found)
    }

    fn pick(&self, task: &Task, mut found: Vec<PathBuf>) -> Option<PathBuf> {
        let preferred = self
            .preferred_extensions
            .iter()
            .find(|(env, _)| *env == task.execution_environment)
            .map(|(_, ext)| ext.as_str());
        if let Some(ext) = preferred {
            if let Some(pos) = found
                .iter()
                .position(|p| p.extension().is_some_and(|e| e == ext))
            {
                return Some(found.swap_remove(pos));
            }
        }
        found.into_iter().next()
    }
}

#[async_trait]
impl CodeProvider for FileCodeProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, task: &Task) -> Result<Option<String>, BackendError> {
        let found = self.candidates(&task.id)?;
        let Some(path) = self.pick(task, found) else {
            tracing::debug!(task_id = %task.id, dir = %self.dir.display(), "no code file");
            return Ok(None);
        };
        let code = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BackendError::Provider(format!("{}: {e}", path.display())))?;
        tracing::info!(task_id = %task.id, path = %path.display(), "loaded implementation");
        Ok(Some(code))
    }
}
