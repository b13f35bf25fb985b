use serde::{Deserialize, Serialize};

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanStep {
    ExecuteTask {
        task_id: String,
        task_name: String,
        duration: u64,
        start_time: u64,
        end_time: u64,
        resources_used: Vec<String>,
    },
    /// Planning stopped; always the last step when present.
    Error { message: String, time: u64 },
}

impl PlanStep {
    pub fn error(message: impl Into<String>, time: u64) -> Self {
        PlanStep::Error {
            message: message.into(),
            time,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            PlanStep::ExecuteTask { task_id, .. } => Some(task_id),
            PlanStep::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// True when every goal was scheduled without an error step.
    pub fn is_satisfied(&self) -> bool {
        self.error().is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match step {
            PlanStep::Error { message, .. } => Some(message.as_str()),
            PlanStep::ExecuteTask { .. } => None,
        })
    }

    /// Latest end time over all executed steps.
    pub fn makespan(&self) -> u64 {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlanStep::ExecuteTask { end_time, .. } => Some(*end_time),
                PlanStep::Error { .. } => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn task_order(&self) -> Vec<&str> {
        self.steps.iter().filter_map(PlanStep::task_id).collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_steps_serialize_with_action_tag() {
        let plan = Plan {
            steps: vec![
                PlanStep::ExecuteTask {
                    task_id: "a".into(),
                    task_name: "A".into(),
                    duration: 2,
                    start_time: 0,
                    end_time: 2,
                    resources_used: vec!["dev".into()],
                },
                PlanStep::error("stuck", 2),
            ],
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["steps"][0]["action"], json!("execute_task"));
        assert_eq!(value["steps"][1], json!({"action": "error", "message": "stuck", "time": 2}));
        assert!(!plan.is_satisfied());
        assert_eq!(plan.makespan(), 2);
        assert_eq!(plan.task_order(), vec!["a"]);
    }
}
