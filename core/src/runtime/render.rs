use serde::Serialize;

use super::RunReport;
use crate::executor::ExecutionResult;

/// Output renderer plugin (controls how run progress is shown)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn supports_streaming(&self) -> bool {
        false
    }
    fn render(&self, event: &RenderEvent);
}

/// Progress events of a workflow run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_tasks: usize,
        goals: Vec<String>,
    },
    /// Dependency stages found during preflight.
    Plan {
        run_id: String,
        stages: Vec<Vec<String>>,
    },
    TaskStart {
        run_id: String,
        task_id: String,
        environment: String,
    },
    TaskComplete {
        run_id: String,
        task_id: String,
        duration_ms: u64,
        result: ExecutionResult,
    },
    TasksBlocked {
        run_id: String,
        task_ids: Vec<String>,
    },
    RunEnd {
        run_id: String,
        report: RunReport,
    },
}
