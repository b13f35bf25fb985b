use thiserror::Error;

use super::ErrorCode;

/// Errors raised while building or ordering a task dependency graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

impl GraphError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateTaskId(_) => ErrorCode::ValidationError,
            Self::DependencyNotFound { .. } => ErrorCode::DependencyError,
            Self::CircularDependency(_) => ErrorCode::CircularDependency,
        }
    }
}
