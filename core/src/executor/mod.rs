//! Black-box executor.
//!
//! ```text
//! raw inputs ─ prepare_context() ─> ExecutionContext { errors: input violations }
//!                                     ↓
//! execute(): errors? ─ yes ─> ExecutionResult { success: false }   (nothing invoked)
//!              │ no
//!              ├─ CodeProvider::fetch()   (only when the task has no code yet)
//!              ├─ BackendRegistry::resolve(execution_environment)
//!              ├─ ExecutorBackend::run()  (panics contained)
//!              └─ ContractValidator::validate_outputs()
//! ```

pub mod backend;
pub mod native;
pub mod provider;

pub use backend::{BackendOutput, BackendRegistry, BackendRequest, ExecutorBackend};
pub use native::{NativeBackend, NativeFn, NATIVE_ENVIRONMENT};
pub use provider::{CodeProvider, StaticCodeProvider};

use futures::FutureExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use crate::error::BackendError;
use crate::model::{ExecutionContext, Task};
use crate::validator::ContractValidator;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub outputs: Map<String, Value>,
    pub errors: Vec<String>,
    pub trace: Vec<String>,
}

impl ExecutionResult {
    fn from_context(context: &ExecutionContext) -> Self {
        Self {
            success: context.errors.is_empty(),
            outputs: context.outputs.clone(),
            errors: context.errors.clone(),
            trace: context.trace.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BlackBoxExecutor {
    backends: Arc<BackendRegistry>,
    provider: Option<Arc<dyn CodeProvider>>,
    validator: ContractValidator,
}

impl BlackBoxExecutor {
    pub fn new(backends: BackendRegistry) -> Self {
        Self {
            backends: Arc::new(backends),
            provider: None,
            validator: ContractValidator::default(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn CodeProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_validator(mut self, validator: ContractValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Build a context for one attempt. Input violations are recorded, never raised.
    pub fn prepare_context(&self, task: &Task, raw_inputs: Map<String, Value>) -> ExecutionContext {
        let violations = self.validator.validate_inputs(task, &raw_inputs);
        let mut context = ExecutionContext::new(&task.id, raw_inputs);
        context
            .errors
            .extend(violations.iter().map(ToString::to_string));
        context
    }

    /// Run the task's implementation and validate what it returns.
    #[tracing::instrument(skip_all, fields(task_id = %task.id, environment = %task.execution_environment))]
    pub async fn execute(&self, task: &mut Task, context: &mut ExecutionContext) -> ExecutionResult {
        if context.has_errors() {
            tracing::warn!(errors = context.errors.len(), "inputs rejected, not executing");
            return ExecutionResult::from_context(context);
        }

        context
            .trace
            .push(format!("Starting task {} with validated inputs", task.id));

        match self.invoke(task, context).await {
            Ok(output) => {
                context.trace.extend(output.trace.iter().cloned());
                context.outputs = output.into_outputs();
                let violations = self.validator.validate_outputs(task, &context.outputs);
                context
                    .errors
                    .extend(violations.iter().map(ToString::to_string));
            }
            Err(err) => {
                tracing::warn!(error = %err, "execution failed");
                context.errors.push(format!("execution error: {err}"));
            }
        }

        if context.errors.is_empty() {
            context.trace.push(format!(
                "Task {} completed successfully with validated outputs",
                task.id
            ));
        } else {
            context
                .trace
                .push(format!("Task {} failed: {}", task.id, context.errors.join("; ")));
        }

        ExecutionResult::from_context(context)
    }

    /// `prepare_context` followed by `execute`.
    pub async fn run(
        &self,
        task: &mut Task,
        inputs: Map<String, Value>,
    ) -> (ExecutionContext, ExecutionResult) {
        let mut context = self.prepare_context(task, inputs);
        let result = self.execute(task, &mut context).await;
        (context, result)
    }

    async fn invoke(
        &self,
        task: &mut Task,
        context: &ExecutionContext,
    ) -> Result<BackendOutput, BackendError> {
        let backend = self.backends.resolve(&task.execution_environment)?;

        if task.generated_code.is_none() {
            if let Some(provider) = &self.provider {
                if let Some(code) = provider.fetch(task).await? {
                    tracing::debug!(provider = provider.name(), "generated code fetched");
                    task.generated_code = Some(strip_code_fences(&code));
                }
            }
        }

        let request = BackendRequest {
            task_id: task.id.clone(),
            entry_point: task.entry_point(),
            environment: task.execution_environment.clone(),
            code: task.generated_code.as_deref().map(strip_code_fences),
            inputs: context.inputs.clone(),
        };

        AssertUnwindSafe(backend.run(request))
            .catch_unwind()
            .await
            .map_err(|payload| BackendError::Panicked(panic_message(payload.as_ref())))?
    }
}

static FENCE_OPEN: OnceLock<Regex> = OnceLock::new();

/// Drop markdown code fences around generated code.
pub fn strip_code_fences(code: &str) -> String {
    let open = FENCE_OPEN.get_or_init(|| Regex::new(r"```\w*\n").expect("FENCE_OPEN is valid"));
    open.replace_all(code, "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contract, DataType, InputSpec, OutputSpec};
    use serde_json::json;

    fn adder() -> Task {
        let mut contract = Contract::new("add-numbers");
        contract.inputs = vec![
            InputSpec::new("a", DataType::Integer),
            InputSpec::new("b", DataType::Integer),
        ];
        contract.outputs = vec![OutputSpec::new("sum", DataType::Integer)];
        Task::new("add-numbers", "Add", 1, contract)
            .unwrap()
            .with_environment(NATIVE_ENVIRONMENT)
    }

    fn executor() -> BlackBoxExecutor {
        let native = NativeBackend::default()
            .with_function("add_numbers", |inputs| {
                let a = inputs["a"].as_i64().unwrap_or_default();
                let b = inputs["b"].as_i64().unwrap_or_default();
                Ok(json!({ "sum": a + b }))
            })
            .with_function("explode", |_| panic!("boom"));
        BlackBoxExecutor::new(BackendRegistry::new().with(Arc::new(native)))
    }

    fn inputs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_successful_execution() {
        let mut task = adder();
        let (_, result) = executor().run(&mut task, inputs(json!({"a": 2, "b": 3}))).await;

        assert!(result.success);
        assert_eq!(result.outputs["sum"], json!(5));
        assert_eq!(
            result.trace.first().map(String::as_str),
            Some("Starting task add-numbers with validated inputs")
        );
        assert_eq!(
            result.trace.last().map(String::as_str),
            Some("Task add-numbers completed successfully with validated outputs")
        );
    }

    #[tokio::test]
    async fn test_preexisting_errors_short_circuit() {
        let mut task = adder();
        let mut context = executor().prepare_context(&task, inputs(json!({"a": 2})));
        assert_eq!(context.errors.len(), 1);

        let result = executor().execute(&mut task, &mut context).await;
        assert!(!result.success);
        assert!(result.trace.is_empty());
        assert!(context.trace.is_empty());
    }

    #[tokio::test]
    async fn test_panic_becomes_single_error() {
        let mut task = Task::new("explode", "Explode", 1, Contract::new("explode"))
            .unwrap()
            .with_environment(NATIVE_ENVIRONMENT);
        let (_, result) = executor().run(&mut task, Map::new()).await;

        assert!(!result.success);
        assert_eq!(result.errors, vec!["execution error: implementation panicked: boom"]);
    }

    #[tokio::test]
    async fn test_unsupported_environment() {
        let mut task = adder().with_environment("cobol");
        let (_, result) = executor().run(&mut task, inputs(json!({"a": 1, "b": 1}))).await;
        assert_eq!(
            result.errors,
            vec!["execution error: execution environment 'cobol' not supported"]
        );
    }

    #[tokio::test]
    async fn test_code_fetched_once_and_persisted() {
        let provider = StaticCodeProvider::new().with_code("add-numbers", "```python\ndef add_numbers(a, b): ...\n```");
        let executor = executor().with_provider(Arc::new(provider));
        let mut task = adder();

        executor.run(&mut task, inputs(json!({"a": 1, "b": 1}))).await;
        assert_eq!(
            task.generated_code.as_deref(),
            Some("def add_numbers(a, b): ...")
        );
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```js\nfoo()\n```\n"), "foo()");
        assert_eq!(strip_code_fences("plain"), "plain");
    }
}
