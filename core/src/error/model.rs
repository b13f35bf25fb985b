use thiserror::Error;

use super::ErrorCode;

/// Data-integrity violations. These abort construction of the model itself;
/// ordinary contract mismatches are reported as `Violation`s instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("task id must not be empty")]
    EmptyTaskId,

    #[error("task '{task_id}' has invalid duration {duration}: must be positive")]
    InvalidDuration { task_id: String, duration: u64 },

    #[error("contract of task '{task_id}' is linked to task '{contract_task_id}'")]
    ContractLinkMismatch {
        task_id: String,
        contract_task_id: String,
    },

    #[error("task '{task_id}' declares {kind} '{name}' more than once")]
    DuplicateSpecName {
        task_id: String,
        kind: &'static str,
        name: String,
    },

    #[error("task '{0}' depends on itself")]
    SelfDependency(String),

    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("duplicate resource id: {0}")]
    DuplicateResourceId(String),

    #[error("resource '{0}' has invalid capacity 0")]
    InvalidCapacity(String),

    #[error("task '{task_id}' depends on unknown task '{dependency}'")]
    UnknownDependency { task_id: String, dependency: String },

    #[error("task '{task_id}' requires unknown resource '{resource_id}'")]
    UnknownResource {
        task_id: String,
        resource_id: String,
    },

    #[error("unknown completed task id: {0}")]
    UnknownCompletedTask(String),

    #[error("failed to parse state document: {0}")]
    Parse(String),

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
}

impl ModelError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownDependency { .. } => ErrorCode::DependencyError,
            Self::SelfDependency(_) => ErrorCode::CircularDependency,
            Self::Parse(_) => ErrorCode::ParseError,
            Self::Read { .. } => ErrorCode::GeneralError,
            _ => ErrorCode::IntegrityError,
        }
    }
}
