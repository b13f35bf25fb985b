pub mod contract;
pub mod context;
pub mod resource;
pub mod state;
pub mod task;
pub mod transitions;
pub mod types;

pub use contract::{Contract, InputSpec, OutputSpec};
pub use context::ExecutionContext;
pub use resource::Resource;
pub use state::{PlanningState, StateDocument};
pub use task::Task;
pub use transitions::{TaskTransition, TransitionError};
pub use types::{DataType, ResourceType, TaskStatus, DATA_TYPE_SCHEMA_VERSION};
