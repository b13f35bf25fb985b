#![allow(dead_code)]

use pactflow_core::model::{Contract, PlanningState, Resource, ResourceType, Task};
use serde_json::{Map, Value};

pub const SAMPLE_STATE: &str = include_str!("../fixtures/sample_state.json");

/// The authentication / dashboard example state.
pub fn sample_state() -> PlanningState {
    PlanningState::from_json_str(SAMPLE_STATE).expect("sample state is valid")
}

pub fn task(id: &str, duration: u64, deps: &[&str]) -> Task {
    Task::new(id, id.to_uppercase(), duration, Contract::new(id))
        .expect("valid task")
        .with_dependencies(deps.iter().copied())
}

pub fn resource(id: &str) -> Resource {
    Resource::new(id, id, ResourceType::Other)
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("json object")
}

pub fn goals(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Route tracing output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
