use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::BackendError;

/// Everything a backend needs to run one implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub task_id: String,
    /// Function the implementation must define (task id, lowercased, `-` to `_`).
    pub entry_point: String,
    pub environment: String,
    pub code: Option<String>,
    /// Inputs that already passed contract validation.
    pub inputs: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendOutput {
    pub value: Value,
    #[serde(default)]
    pub trace: Vec<String>,
}

impl BackendOutput {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            trace: Vec::new(),
        }
    }

    /// Output as a name -> value map; anything that is not an object becomes `{"result": v}`.
    pub fn into_outputs(self) -> Map<String, Value> {
        match self.value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        }
    }
}

/// Isolation boundary around generated implementations.
#[async_trait]
pub trait ExecutorBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Environment tags this backend serves.
    fn environments(&self) -> Vec<String>;

    async fn run(&self, request: BackendRequest) -> Result<BackendOutput, BackendError>;
}

/// Routes an `execution_environment` tag to its backend.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    routes: HashMap<String, Arc<dyn ExecutorBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations win for environments served by several backends.
    pub fn register(&mut self, backend: Arc<dyn ExecutorBackend>) -> &mut Self {
        for env in backend.environments() {
            tracing::debug!(backend = backend.name(), environment = %env, "backend registered");
            self.routes.insert(env, backend.clone());
        }
        self
    }

    pub fn with(mut self, backend: Arc<dyn ExecutorBackend>) -> Self {
        self.register(backend);
        self
    }

    pub fn resolve(&self, environment: &str) -> Result<Arc<dyn ExecutorBackend>, BackendError> {
        self.routes
            .get(environment)
            .cloned()
            .ok_or_else(|| BackendError::UnsupportedEnvironment(environment.to_string()))
    }

    pub fn environments(&self) -> Vec<String> {
        let mut envs: Vec<String> = self.routes.keys().cloned().collect();
        envs.sort();
        envs
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("environments", &self.environments())
            .finish()
    }
}
