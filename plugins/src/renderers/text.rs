use pactflow_core::runtime::{OutputRendererPlugin, RenderEvent};

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
                goals,
            } => {
                let goals = if goals.is_empty() {
                    "all".to_string()
                } else {
                    goals.join(", ")
                };
                format!("RUN START {} (tasks: {}, goals: {})", run_id, total_tasks, goals)
            }
            RenderEvent::Plan { run_id, stages } => {
                let mut out = format!("PLAN {}:", run_id);
                for (idx, stage) in stages.iter().enumerate() {
                    out.push_str(&format!("\n  stage {}: {}", idx, stage.join(", ")));
                }
                out
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                environment,
            } => format!("TASK START {} (task {}, env {})", run_id, task_id, environment),
            RenderEvent::TaskComplete {
                run_id,
                task_id,
                duration_ms,
                result,
            } => {
                let status = match (result.success, self.ascii_only) {
                    (true, true) => "OK",
                    (true, false) => "SUCCESS",
                    (false, true) => "FAIL",
                    (false, false) => "FAILED",
                };
                let mut line = format!(
                    "TASK END {} (task {}, status {}, duration {}ms)",
                    run_id, task_id, status, duration_ms
                );
                for err in &result.errors {
                    line.push_str(&format!("\n  error: {}", err));
                }
                line
            }
            RenderEvent::TasksBlocked { run_id, task_ids } => {
                format!("BLOCKED {} ({})", run_id, task_ids.join(", "))
            }
            RenderEvent::RunEnd { run_id, report } => {
                let mut line = format!(
                    "RUN END {} (completed {}, failed {}, blocked {}, duration {}ms)",
                    run_id,
                    report.completed.len(),
                    report.failed.len(),
                    report.blocked.len(),
                    report.duration_ms
                );
                if !report.unresolved.is_empty() {
                    line.push_str(&format!("\n  unresolved goals: {}", report.unresolved.join(", ")));
                }
                line
            }
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactflow_core::executor::ExecutionResult;

    #[test]
    fn test_text_renderer_task_complete() {
        let renderer = TextRendererPlugin::new(true);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            task_id: "task".to_string(),
            duration_ms: 5,
            result: ExecutionResult {
                success: false,
                errors: vec!["execution error: boom".to_string()],
                ..Default::default()
            },
        };

        let line = renderer.format_event(&event);
        assert!(line.starts_with("TASK END run (task task, status FAIL, duration 5ms)"));
        assert!(line.contains("error: execution error: boom"));
    }

    #[test]
    fn test_text_renderer_run_start_without_goals() {
        let renderer = TextRendererPlugin::new(false);
        let line = renderer.format_event(&RenderEvent::RunStart {
            run_id: "r".to_string(),
            total_tasks: 2,
            goals: Vec::new(),
        });
        assert_eq!(line, "RUN START r (tasks: 2, goals: all)");
    }
}
