pub mod backend;
pub mod cli;
pub mod graph;
pub mod model;
pub mod store;

pub use backend::BackendError;
pub use cli::CliError;
pub use graph::GraphError;
pub use model::ModelError;
pub use store::StoreError;

/// Stable error codes shared by the CLI exit status and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    TaskNotFound = 10,
    DependencyError = 11,
    CircularDependency = 12,
    IntegrityError = 13,
    UnsupportedEnvironment = 20,
    ExecutionError = 21,
    Timeout = 30,
    StorageError = 40,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}
