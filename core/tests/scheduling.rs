mod common;

use common::{goals, resource, sample_state, task};
use pactflow_core::model::{PlanningState, TaskStatus};
use pactflow_core::scheduler::{Plan, PlanStep, Scheduler};
use pretty_assertions::assert_eq;

fn windows(plan: &Plan) -> Vec<(String, u64, u64)> {
    plan.steps
        .iter()
        .filter_map(|step| match step {
            PlanStep::ExecuteTask {
                task_id,
                start_time,
                end_time,
                ..
            } => Some((task_id.clone(), *start_time, *end_time)),
            PlanStep::Error { .. } => None,
        })
        .collect()
}

#[test]
fn linear_chain_plans_in_order_without_overlap() {
    let state = PlanningState::new(
        vec![task("c", 1, &["b"]), task("a", 2, &[]), task("b", 3, &["a"])],
        vec![],
    )
    .unwrap();

    let plan = Scheduler::default().plan(&state, &[]);

    assert!(plan.is_satisfied());
    assert_eq!(
        windows(&plan),
        vec![
            ("a".to_string(), 0, 2),
            ("b".to_string(), 2, 5),
            ("c".to_string(), 5, 6),
        ]
    );
    for pair in windows(&plan).windows(2) {
        assert!(pair[0].2 <= pair[1].1);
    }
}

#[test]
fn sample_state_plans_auth_before_dashboard() {
    let state = sample_state();
    let plan = Scheduler::default().plan(&state, &[]);

    assert_eq!(plan.task_order(), vec!["auth_system", "dashboard_gen"]);
    assert_eq!(plan.makespan(), 14);
    match &plan.steps[0] {
        PlanStep::ExecuteTask { resources_used, .. } => {
            assert_eq!(resources_used, &vec!["developer".to_string(), "database".to_string()])
        }
        other => panic!("unexpected step {other:?}"),
    }
}

#[test]
fn cyclic_resource_hold_deadlocks_into_single_error() {
    let tasks = vec![
        task("a", 1, &[]).with_resources(["r1"]),
        task("b", 1, &[]).with_resources(["r2"]),
    ];
    let mut state = PlanningState::new(tasks, vec![resource("r1"), resource("r2")]).unwrap();
    // each task's resource is held on behalf of the other
    assert!(state.resource_manager.reserve(&["r1"], "b"));
    assert!(state.resource_manager.reserve(&["r2"], "a"));

    let plan = Scheduler::default().plan(&state, &[]);

    assert_eq!(plan.steps.len(), 1);
    let message = plan.error().unwrap();
    assert!(message.starts_with("Deadlock"), "{message}");
    assert!(message.contains("remaining: a, b"));
    assert!(message.contains("unavailable resources: r1, r2"));
}

#[test]
fn dependency_cycle_reports_path() {
    let state = PlanningState::new(vec![task("a", 1, &["b"]), task("b", 1, &["a"])], vec![]).unwrap();

    let plan = Scheduler::default().plan(&state, &[]);

    assert_eq!(plan.steps.len(), 1);
    assert!(plan.error().unwrap().contains("dependency cycle: a -> b -> a"));
}

#[test]
fn simulate_mutates_and_plan_does_not() {
    let mut state = sample_state();
    let scheduler = Scheduler::default();

    let planned = scheduler.plan(&state, &goals(&["auth_system"]));
    assert_eq!(planned.task_order(), vec!["auth_system"]);
    assert_eq!(state.task("auth_system").unwrap().status, TaskStatus::Pending);

    let simulated = scheduler.simulate(&mut state, &goals(&["auth_system"]));
    assert_eq!(simulated, planned);
    assert_eq!(state.current_time, 8);
    assert_eq!(state.completed_tasks, vec!["auth_system"]);
    assert_eq!(
        state.task("auth_system").unwrap().status,
        TaskStatus::Completed
    );
}

#[test]
fn goal_outside_dependency_closure_deadlocks() {
    let state = sample_state();
    let plan = Scheduler::default().plan(&state, &goals(&["dashboard_gen"]));
    assert!(!plan.is_satisfied());
    assert!(plan.steps.len() == 1);
}
