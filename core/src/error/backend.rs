use thiserror::Error;

use super::ErrorCode;

/// Failures raised by an executor backend or the code provider.
///
/// The executor never propagates these: each one is folded into a single
/// `execution error: ...` entry on the execution result.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("execution environment '{0}' not supported")]
    UnsupportedEnvironment(String),

    #[error("no generated code for task {0}")]
    MissingCode(String),

    #[error("generated code must define entry point '{0}'")]
    MissingEntryPoint(String),

    #[error("code provider failed: {0}")]
    Provider(String),

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("process exited with code {code}: {stderr}")]
    ProcessExit { code: i32, stderr: String },

    #[error("invalid output: {0}")]
    InvalidOutput(String),

    #[error("timeout after {0} ms")]
    Timeout(u64),

    #[error("implementation panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

impl BackendError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedEnvironment(_) => ErrorCode::UnsupportedEnvironment,
            Self::Timeout(_) => ErrorCode::Timeout,
            _ => ErrorCode::ExecutionError,
        }
    }
}
