//! One-way export of a planning state as a PDDL domain and problem.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use crate::model::{PlanningState, TaskStatus};

pub const DOMAIN_NAME: &str = "contract-planning";
pub const PROBLEM_NAME: &str = "contract-plan";

const DOMAIN: &str = include_str!("domain.pddl");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormalDocument {
    pub domain: String,
    pub problem: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormalEmitter;

impl FormalEmitter {
    pub fn new() -> Self {
        Self
    }

    /// The domain is fixed; it does not depend on the state.
    pub fn domain(&self, _state: &PlanningState) -> String {
        DOMAIN.to_string()
    }

    /// Problem for `goals`, or for every task when `goals` is empty.
    pub fn problem(&self, state: &PlanningState, goals: &[String]) -> String {
        let mut names = Names::default();
        let task_objects: Vec<String> = state
            .tasks()
            .map(|t| names.get(ObjectKind::Task, &t.id))
            .collect();
        let resource_objects: Vec<String> = state
            .resources()
            .map(|r| names.get(ObjectKind::Resource, &r.id))
            .collect();
        let fields: BTreeSet<&str> = state
            .tasks()
            .flat_map(|task| {
                task.contract
                    .inputs
                    .iter()
                    .map(|i| i.name.as_str())
                    .chain(task.contract.outputs.iter().map(|o| o.name.as_str()))
            })
            .collect();
        let datatype_objects: Vec<String> = fields
            .into_iter()
            .map(|f| names.get(ObjectKind::Datatype, f))
            .collect();

        let mut init = Facts::default();

        for task in state.tasks() {
            let t = names.get(ObjectKind::Task, &task.id);
            let status = match task.status {
                TaskStatus::Pending | TaskStatus::Blocked => "task-pending",
                TaskStatus::Ready => "task-ready",
                TaskStatus::InProgress => "task-in-progress",
                TaskStatus::Completed => "task-completed",
                TaskStatus::Failed => "task-failed",
            };
            init.push(format!("({status} {t})"));
        }

        for task in state.tasks() {
            let t = names.get(ObjectKind::Task, &task.id);
            for dep in &task.dependencies {
                let d = names.get(ObjectKind::Task, dep);
                init.push(format!("(depends-on {t} {d})"));
            }
        }

        for task in state.tasks() {
            let t = names.get(ObjectKind::Task, &task.id);
            for resource in &task.required_resources {
                let r = names.get(ObjectKind::Resource, resource);
                init.push(format!("(requires-resource {t} {r})"));
            }
        }

        for task in state.tasks() {
            let t = names.get(ObjectKind::Task, &task.id);
            for input in &task.contract.inputs {
                let f = names.get(ObjectKind::Datatype, &input.name);
                init.push(format!("(has-input {t} {f})"));
            }
            for output in &task.contract.outputs {
                let f = names.get(ObjectKind::Datatype, &output.name);
                init.push(format!("(has-output {t} {f})"));
            }
            init.push(format!("(contract-valid {t})"));
        }

        for resource in state.resource_manager.available() {
            let r = names.get(ObjectKind::Resource, &resource);
            init.push(format!("(resource-available {r})"));
        }
        for (resource, task) in state.resource_manager.allocations() {
            let r = names.get(ObjectKind::Resource, &resource);
            let t = names.get(ObjectKind::Task, &task);
            init.push(format!("(resource-allocated {r} {t})"));
        }

        let goal_ids: Vec<String> = if goals.is_empty() {
            state.task_ids()
        } else {
            goals
                .iter()
                .filter(|g| {
                    let known = state.contains_task(g);
                    if !known {
                        tracing::warn!(goal = %g, "unknown goal left out of problem");
                    }
                    known
                })
                .cloned()
                .collect()
        };

        let mut out = String::new();
        let _ = writeln!(out, "(define (problem {PROBLEM_NAME})");
        let _ = writeln!(out, "  (:domain {DOMAIN_NAME})");
        out.push('\n');
        out.push_str("  (:objects\n");
        write_objects(&mut out, &task_objects, "task");
        write_objects(&mut out, &resource_objects, "resource");
        write_objects(&mut out, &datatype_objects, "datatype");
        out.push_str("  )\n\n");

        out.push_str("  (:init\n");
        for fact in &init.facts {
            let _ = writeln!(out, "    {fact}");
        }
        out.push_str("  )\n\n");

        let goal: Vec<String> = goal_ids
            .iter()
            .map(|g| format!("(task-completed {})", names.get(ObjectKind::Task, g)))
            .collect();
        out.push_str("  (:goal\n");
        let _ = writeln!(out, "    (and {})", goal.join(" "));
        out.push_str("  )\n");
        out.push_str(")\n");
        out
    }

    pub fn emit(&self, state: &PlanningState, goals: &[String]) -> FormalDocument {
        let doc = FormalDocument {
            domain: self.domain(state),
            problem: self.problem(state, goals),
        };
        tracing::debug!(
            domain_bytes = doc.domain.len(),
            problem_bytes = doc.problem.len(),
            "formal document emitted"
        );
        doc
    }
}

/// Init facts in first-seen order, without duplicates.
#[derive(Default)]
struct Facts {
    facts: Vec<String>,
    seen: HashSet<String>,
}

impl Facts {
    fn push(&mut self, fact: String) {
        if self.seen.insert(fact.clone()) {
            self.facts.push(fact);
        }
    }
}

fn write_objects(out: &mut String, names: &[String], kind: &str) {
    if names.is_empty() {
        return;
    }
    let _ = writeln!(out, "    {} - {kind}", names.join(" "));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ObjectKind {
    Task,
    Resource,
    Datatype,
}

/// Injective id -> PDDL name mapping shared by every object in one problem.
/// Ids that sanitize to a taken name get a `-2`, `-3`, ... suffix in
/// first-seen order.
#[derive(Default)]
struct Names {
    assigned: HashMap<(ObjectKind, String), String>,
    taken: HashSet<String>,
}

impl Names {
    fn get(&mut self, kind: ObjectKind, id: &str) -> String {
        if let Some(name) = self.assigned.get(&(kind, id.to_string())) {
            return name.clone();
        }
        let base = sanitize(id);
        let mut name = base.clone();
        let mut n = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{base}-{n}");
            n += 1;
        }
        self.assigned.insert((kind, id.to_string()), name.clone());
        name
    }
}

/// PDDL names: lowercase letters, digits, `-` and `_`, starting with a letter.
pub fn sanitize(id: &str) -> String {
    let mut name: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        name.insert_str(0, "n-");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contract, DataType, InputSpec, Resource, ResourceType, Task};

    fn state() -> PlanningState {
        let mut contract = Contract::new("load");
        contract.inputs = vec![InputSpec::new("rows", DataType::Array)];
        let tasks = vec![
            Task::new("extract", "Extract", 1, Contract::new("extract")).unwrap(),
            Task::new("load", "Load", 1, contract)
                .unwrap()
                .with_dependencies(["extract"])
                .with_resources(["db"]),
        ];
        let resources = vec![Resource::new("db", "Warehouse", ResourceType::Database)];
        PlanningState::new(tasks, resources).unwrap()
    }

    #[test]
    fn test_domain_declares_actions() {
        let domain = FormalEmitter::new().domain(&state());
        for action in [
            "validate-inputs",
            "start-task",
            "validate-outputs",
            "complete-task",
            "make-task-ready",
            "fail-task",
        ] {
            assert!(domain.contains(&format!("(:action {action}")), "{action}");
        }
    }

    #[test]
    fn test_problem_facts() {
        let problem = FormalEmitter::new().problem(&state(), &[]);
        assert_eq!(problem.matches("(depends-on load extract)").count(), 1);
        assert!(problem.contains("(requires-resource load db)"));
        assert!(problem.contains("(resource-available db)"));
        assert!(problem.contains("(has-input load rows)"));
        assert!(problem.contains("rows - datatype"));
        assert!(problem.contains("(and (task-completed extract) (task-completed load))"));
        assert_eq!(problem.matches("(contract-valid load)").count(), 1);
    }

    #[test]
    fn test_allocations_and_blocked_status() {
        let mut state = state();
        state.resource_manager.reserve(&["db"], "load");
        state.task_mut("load").unwrap().status = TaskStatus::Blocked;

        let problem = FormalEmitter::new().problem(&state, &["load".to_string()]);
        assert!(problem.contains("(resource-allocated db load)"));
        assert!(!problem.contains("(resource-available db)"));
        assert!(problem.contains("(task-pending load)"));
        assert!(problem.contains("(and (task-completed load))"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Build Report"), "build-report");
        assert_eq!(sanitize("2fa"), "n-2fa");
        assert_eq!(sanitize("auth_system"), "auth_system");
    }

    #[test]
    fn test_colliding_ids_get_distinct_names() {
        let tasks = vec![
            Task::new("Fetch", "Fetch upper", 1, Contract::new("Fetch")).unwrap(),
            Task::new("fetch", "Fetch lower", 1, Contract::new("fetch")).unwrap(),
            Task::new("report", "Report", 1, Contract::new("report"))
                .unwrap()
                .with_dependencies(["Fetch", "fetch"]),
        ];
        let state = PlanningState::new(tasks, vec![]).unwrap();
        let problem = FormalEmitter::new().problem(&state, &[]);

        assert!(problem.contains("    fetch fetch-2 report - task\n"));
        assert_eq!(problem.matches("(depends-on report ").count(), 2);
        assert!(problem.contains("(depends-on report fetch)"));
        assert!(problem.contains("(depends-on report fetch-2)"));
        assert!(problem.contains("(task-completed fetch) (task-completed fetch-2)"));
    }

    #[test]
    fn test_names_are_stable_per_id() {
        let mut names = Names::default();
        assert_eq!(names.get(ObjectKind::Task, "A b"), "a-b");
        assert_eq!(names.get(ObjectKind::Task, "a-b"), "a-b-2");
        assert_eq!(names.get(ObjectKind::Resource, "a-b"), "a-b-3");
        assert_eq!(names.get(ObjectKind::Task, "A b"), "a-b");
    }
}
