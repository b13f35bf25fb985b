use chrono::Local;
use pactflow_core::runtime::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                goals,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_tasks": total_tasks,
                    "goals": goals,
                }
            }),
            RenderEvent::Plan { run_id, stages } => {
                let total_tasks: usize = stages.iter().map(|s| s.len()).sum();
                json!({
                    "v": 1,
                    "event_type": "run.plan",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "stages": stages,
                        "total_tasks": total_tasks,
                    }
                })
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                environment,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "environment": environment,
                }
            }),
            RenderEvent::TaskComplete {
                run_id,
                task_id,
                duration_ms,
                result,
            } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "duration_ms": duration_ms,
                    "success": result.success,
                    "outputs": result.outputs,
                    "errors": result.errors,
                    "trace": result.trace,
                }
            }),
            RenderEvent::TasksBlocked { run_id, task_ids } => json!({
                "v": 1,
                "event_type": "task.blocked",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "tasks": task_ids,
                }
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "completed": report.completed,
                    "failed": report.failed,
                    "blocked": report.blocked,
                    "unresolved": report.unresolved,
                    "duration_ms": report.duration_ms,
                    "success": report.is_success(),
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}
