//! pactflow-core: contract-enforced task planning and black-box execution.
//!
//! ```text
//! StateDocument (json/toml)
//!   ↓
//! PlanningState { tasks, resources, completed, failed, clock, ResourceManager }
//!   ├─ Scheduler::plan()          → Plan { execute_task | error }
//!   ├─ FormalEmitter::emit()      → FormalDocument { domain, problem }
//!   ├─ ContractValidator::audit() → per-task violations
//!   └─ WorkflowRunner::run()      → RunReport (BlackBoxExecutor per task)
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod model;
pub mod resources;
pub mod runtime;
pub mod scheduler;
pub mod store;
pub mod templates;
pub mod validator;

pub use emitter::{FormalDocument, FormalEmitter};
pub use executor::{BlackBoxExecutor, ExecutionResult};
pub use model::{
    Contract, DataType, ExecutionContext, InputSpec, OutputSpec, PlanningState, Resource,
    ResourceType, StateDocument, Task, TaskStatus,
};
pub use resources::ResourceManager;
pub use scheduler::{Plan, PlanStep, Scheduler, TaskGraph};
pub use validator::{ContractValidator, Rule, Violation, ViolationKind};
