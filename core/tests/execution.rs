mod common;

use async_trait::async_trait;
use common::{init_tracing, object, sample_state};
use pactflow_core::error::BackendError;
use pactflow_core::executor::{
    BackendOutput, BackendRegistry, BackendRequest, BlackBoxExecutor, ExecutorBackend,
    StaticCodeProvider,
};
use pactflow_core::runtime::{shared, TaskInputs, WorkflowRunner};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stands in for the python sandbox; records every request it receives.
#[derive(Default)]
struct RecordingBackend {
    calls: AtomicUsize,
    requests: Mutex<Vec<BackendRequest>>,
}

#[async_trait]
impl ExecutorBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn environments(&self) -> Vec<String> {
        vec!["python".to_string()]
    }

    async fn run(&self, request: BackendRequest) -> Result<BackendOutput, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = match request.entry_point.as_str() {
            "auth_system" => json!({"auth_token": "eyJhbGciOi", "user_id": 7}),
            "dashboard_gen" => json!({
                "dashboard_html": "<div>hi</div>",
                "analytics_data": {"metrics": []}
            }),
            _ => json!(null),
        };
        self.requests.lock().unwrap().push(request);
        Ok(BackendOutput {
            value,
            trace: vec!["sandbox ok".to_string()],
        })
    }
}

#[tokio::test]
async fn preexisting_errors_skip_backend_and_trace() {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let executor = BlackBoxExecutor::new(BackendRegistry::new().with(backend.clone()));
    let state = sample_state();
    let mut task = state.task("auth_system").unwrap().clone();

    let mut context = executor.prepare_context(&task, object(json!({"user_data": {}})));
    let result = executor.execute(&mut task, &mut context).await;

    assert!(!result.success);
    assert_eq!(
        result.errors,
        vec!["Required input 'auth_config' missing for task auth_system"]
    );
    assert!(result.trace.is_empty());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn output_violations_fail_the_task() {
    let backend = Arc::new(RecordingBackend::default());
    let executor = BlackBoxExecutor::new(BackendRegistry::new().with(backend.clone()));
    let state = sample_state();
    let mut task = state.task("dashboard_gen").unwrap().clone();
    task.id = "unknown_entry".into();
    task.contract.task_id = "unknown_entry".into();

    let inputs = object(json!({"user_id": 7, "dashboard_config": {"widgets": []}}));
    let (_, result) = executor.run(&mut task, inputs).await;

    // null output is wrapped as {"result": null}, so both declared outputs are missing
    assert!(!result.success);
    assert_eq!(
        result.errors,
        vec![
            "Required output 'dashboard_html' missing for task unknown_entry",
            "Required output 'analytics_data' missing for task unknown_entry",
        ]
    );
    assert!(result.trace.contains(&"sandbox ok".to_string()));
}

#[tokio::test]
async fn sample_workflow_runs_end_to_end() {
    init_tracing();
    let backend = Arc::new(RecordingBackend::default());
    let provider = StaticCodeProvider::new()
        .with_code("auth_system", "def auth_system(user_data, auth_config): ...")
        .with_code("dashboard_gen", "def dashboard_gen(user_id, dashboard_config): ...");
    let executor =
        BlackBoxExecutor::new(BackendRegistry::new().with(backend.clone())).with_provider(Arc::new(provider));
    let runner = WorkflowRunner::new(executor, 2);

    let mut inputs = TaskInputs::new();
    inputs.insert(
        "auth_system".into(),
        object(json!({
            "user_data": {"username": "testuser", "password": "securepass123"},
            "auth_config": {"jwt_secret": "mysecret", "expiry_time": 3600}
        })),
    );
    inputs.insert(
        "dashboard_gen".into(),
        object(json!({"dashboard_config": {"widgets": [], "layout": "grid"}})),
    );

    let state = shared(sample_state());
    let report = runner.run(state.clone(), &[], &inputs).await.unwrap();

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.completed, vec!["auth_system", "dashboard_gen"]);

    // user_id flowed from auth_system's outputs into dashboard_gen's inputs
    let requests = backend.requests.lock().unwrap();
    let dashboard = requests
        .iter()
        .find(|r| r.task_id == "dashboard_gen")
        .unwrap();
    assert_eq!(dashboard.inputs["user_id"], json!(7));
    assert!(dashboard.code.as_deref().unwrap().starts_with("def dashboard_gen"));

    let st = state.lock().unwrap();
    assert!(st.task("auth_system").unwrap().generated_code.is_some());
    assert_eq!(st.resource_manager.available(), vec!["developer", "database"]);
}
