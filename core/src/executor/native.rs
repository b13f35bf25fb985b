//! Trusted in-process backend.
//!
//! Implementations are Rust functions registered by entry point. Code text on
//! the task is ignored; nothing is ever evaluated.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::backend::{BackendOutput, BackendRequest, ExecutorBackend};
use crate::error::BackendError;

pub const NATIVE_ENVIRONMENT: &str = "native";

pub type NativeFn = Arc<dyn Fn(&Map<String, Value>) -> Result<Value, String> + Send + Sync>;

#[derive(Clone)]
pub struct NativeBackend {
    environment: String,
    functions: HashMap<String, NativeFn>,
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(NATIVE_ENVIRONMENT)
    }
}

impl NativeBackend {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            functions: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, entry_point: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Map<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.insert(entry_point.into(), Arc::new(f));
        self
    }

    pub fn with_function<F>(mut self, entry_point: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register(entry_point, f);
        self
    }

    pub fn contains(&self, entry_point: &str) -> bool {
        self.functions.contains_key(entry_point)
    }
}

#[async_trait]
impl ExecutorBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn environments(&self) -> Vec<String> {
        vec![self.environment.clone()]
    }

    async fn run(&self, request: BackendRequest) -> Result<BackendOutput, BackendError> {
        let f = self
            .functions
            .get(&request.entry_point)
            .ok_or_else(|| BackendError::MissingEntryPoint(request.entry_point.clone()))?;

        let value = f(&request.inputs).map_err(BackendError::Failed)?;
        Ok(BackendOutput {
            value,
            trace: vec![format!("native function '{}' returned", request.entry_point)],
        })
    }
}
