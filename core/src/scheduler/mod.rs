//! Greedy ready-set scheduler on a logical clock.

pub mod graph;
pub mod plan;

pub use graph::TaskGraph;
pub use plan::{Plan, PlanStep};

use crate::model::{PlanningState, TaskStatus};
use crate::validator::ContractValidator;

pub const DEFAULT_ITERATION_FACTOR: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    /// Iteration budget is `iteration_factor * task_count`.
    pub iteration_factor: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION_FACTOR)
    }
}

impl Scheduler {
    pub fn new(iteration_factor: usize) -> Self {
        Self { iteration_factor }
    }

    /// Plan against a copy of `state`; the caller's state is left untouched.
    /// An empty `goals` slice means every task, in insertion order.
    pub fn plan(&self, state: &PlanningState, goals: &[String]) -> Plan {
        let mut scratch = state.clone();
        self.simulate(&mut scratch, goals)
    }

    /// Plan by advancing `state` itself: statuses, clock and completed list.
    #[tracing::instrument(level = "debug", skip_all, fields(goals = goals.len()))]
    pub fn simulate(&self, state: &mut PlanningState, goals: &[String]) -> Plan {
        let goals: Vec<String> = if goals.is_empty() {
            state.task_ids()
        } else {
            goals.to_vec()
        };

        let mut plan = Plan::default();

        let unknown: Vec<&str> = goals
            .iter()
            .filter(|g| !state.contains_task(g))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            plan.steps.push(PlanStep::error(
                format!("Unknown goal tasks: {}", unknown.join(", ")),
                state.current_time,
            ));
            return plan;
        }

        let budget = self.iteration_factor.saturating_mul(state.task_count());
        let validator = ContractValidator::default();
        let mut iterations = 0;

        loop {
            let remaining: Vec<&String> = goals.iter().filter(|g| !state.is_completed(g)).collect();
            if remaining.is_empty() {
                break;
            }
            if iterations >= budget {
                let message = format!(
                    "Iteration budget of {budget} exhausted; unmet goals: {}",
                    join(&remaining)
                );
                tracing::warn!(budget, "{message}");
                plan.steps.push(PlanStep::error(message, state.current_time));
                return plan;
            }
            iterations += 1;

            state.block_failed_dependents();

            let Some(task_id) = remaining
                .iter()
                .find(|id| is_ready(state, id))
                .map(|id| id.to_string())
            else {
                let message = deadlock_message(state, &remaining);
                tracing::warn!("{message}");
                plan.steps.push(PlanStep::error(message, state.current_time));
                return plan;
            };

            match self.run_step(state, &validator, &task_id) {
                Ok(step) => plan.steps.push(step),
                Err(message) => {
                    tracing::warn!(task_id, "{message}");
                    plan.steps.push(PlanStep::error(message, state.current_time));
                    return plan;
                }
            }
        }

        tracing::info!(
            steps = plan.steps.len(),
            makespan = plan.makespan(),
            "plan complete"
        );
        plan
    }

    fn run_step(
        &self,
        state: &mut PlanningState,
        validator: &ContractValidator,
        task_id: &str,
    ) -> Result<PlanStep, String> {
        let task = state
            .task(task_id)
            .ok_or_else(|| format!("Task {task_id} disappeared from state"))?;

        let violations = validator.check_contract(task);
        if !violations.is_empty() {
            let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
            return Err(format!(
                "Contract check failed for task {task_id}: {}",
                details.join("; ")
            ));
        }

        let task_name = task.name.clone();
        let duration = task.duration_hours;
        let resources = task.required_resources.clone();
        let start_time = state.current_time;
        let end_time = start_time.checked_add(duration).ok_or_else(|| {
            format!("Logical clock overflow scheduling task {task_id}: {start_time} + {duration}")
        })?;

        if let Some(task) = state.task_mut(task_id) {
            task.transition_to(TaskStatus::Ready)
                .and_then(|_| task.transition_to(TaskStatus::InProgress))
                .map_err(|e| format!("Task {task_id}: {e}"))?;
        }

        if !state.resource_manager.reserve(&resources, task_id) {
            let conflicts = state.resource_manager.conflicts(&resources);
            return Err(format!(
                "Resource conflict for task {task_id}: {}",
                conflicts.join(", ")
            ));
        }

        tracing::debug!(task_id, start_time, end_time, ?resources, "scheduled");

        state.current_time = end_time;
        state.resource_manager.release(task_id);
        state
            .mark_completed(task_id)
            .map_err(|e| format!("Task {task_id}: {e}"))?;

        Ok(PlanStep::ExecuteTask {
            task_id: task_id.to_string(),
            task_name,
            duration,
            start_time,
            end_time,
            resources_used: resources,
        })
    }
}

fn is_ready(state: &PlanningState, task_id: &str) -> bool {
    state.task(task_id).is_some_and(|task| {
        task.status == TaskStatus::Pending
            && state.dependencies_completed(task)
            && state
                .resource_manager
                .all_available(&task.required_resources)
    })
}

fn deadlock_message(state: &PlanningState, remaining: &[&String]) -> String {
    let mut message = format!(
        "Deadlock: no executable tasks; remaining: {}",
        join(remaining)
    );

    if let Some(cycle) = TaskGraph::from_tasks(state.tasks())
        .ok()
        .and_then(|graph| graph.cycle_path())
    {
        message.push_str(&format!("; dependency cycle: {cycle}"));
    }

    let blocked = state.ids_with_status(TaskStatus::Blocked);
    if !blocked.is_empty() {
        message.push_str(&format!("; blocked: {}", blocked.join(", ")));
    }

    let held: Vec<String> = remaining
        .iter()
        .filter_map(|id| state.task(id))
        .flat_map(|task| state.resource_manager.conflicts(&task.required_resources))
        .collect();
    if !held.is_empty() {
        message.push_str(&format!("; unavailable resources: {}", held.join(", ")));
    }

    message
}

fn join(ids: &[&String]) -> String {
    ids.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contract, Resource, ResourceType, Task};
    use pretty_assertions::assert_eq;

    fn task(id: &str, duration: u64, deps: &[&str]) -> Task {
        Task::new(id, id.to_uppercase(), duration, Contract::new(id))
            .unwrap()
            .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_plan_leaves_caller_state_untouched() {
        let state = PlanningState::new(vec![task("a", 1, &[])], vec![]).unwrap();
        let plan = Scheduler::default().plan(&state, &[]);
        assert!(plan.is_satisfied());
        assert_eq!(state.task("a").unwrap().status, TaskStatus::Pending);
        assert_eq!(state.current_time, 0);
        assert!(state.completed_tasks.is_empty());
    }

    #[test]
    fn test_unknown_goal_is_single_error() {
        let state = PlanningState::new(vec![task("a", 1, &[])], vec![]).unwrap();
        let plan = Scheduler::default().plan(&state, &["zzz".to_string()]);
        assert_eq!(
            plan.steps,
            vec![PlanStep::error("Unknown goal tasks: zzz", 0)]
        );
    }

    #[test]
    fn test_ready_ties_broken_by_goal_order() {
        let state =
            PlanningState::new(vec![task("a", 1, &[]), task("b", 1, &[])], vec![]).unwrap();
        let plan = Scheduler::default().plan(&state, &["b".to_string(), "a".to_string()]);
        assert_eq!(plan.task_order(), vec!["b", "a"]);
    }

    #[test]
    fn test_resources_released_between_steps() {
        let resources = vec![Resource::new("dev", "Dev", ResourceType::Developer)];
        let tasks = vec![
            task("a", 2, &[]).with_resources(["dev"]),
            task("b", 3, &[]).with_resources(["dev"]),
        ];
        let mut state = PlanningState::new(tasks, resources).unwrap();
        let plan = Scheduler::default().simulate(&mut state, &[]);

        assert!(plan.is_satisfied());
        assert_eq!(plan.makespan(), 5);
        assert_eq!(state.resource_manager.available(), vec!["dev"]);
        assert_eq!(state.task("b").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_failed_dependency_blocks_and_deadlocks() {
        let mut failed = task("a", 1, &[]);
        failed.status = TaskStatus::Failed;
        let state = PlanningState::new(vec![failed, task("b", 1, &["a"])], vec![]).unwrap();

        let plan = Scheduler::default().plan(&state, &["b".to_string()]);
        let message = plan.error().unwrap();
        assert!(message.starts_with("Deadlock"));
        assert!(message.contains("blocked: b"));
    }

    #[test]
    fn test_zero_budget_reports_exhaustion() {
        let state = PlanningState::new(vec![task("a", 1, &[])], vec![]).unwrap();
        let plan = Scheduler::new(0).plan(&state, &[]);
        assert_eq!(plan.steps.len(), 1);
        assert!(plan.error().unwrap().starts_with("Iteration budget of 0 exhausted"));
    }

    #[test]
    fn test_clock_overflow_is_error_step() {
        let mut state = PlanningState::new(vec![task("a", 10, &[])], vec![]).unwrap();
        state.current_time = u64::MAX - 5;
        let plan = Scheduler::default().plan(&state, &[]);

        assert_eq!(plan.steps.len(), 1);
        assert!(plan
            .error()
            .unwrap()
            .starts_with("Logical clock overflow scheduling task a"));
    }
}
