//! plan / validate / audit / emit
use std::collections::BTreeMap;
use std::fmt::Write as _;

use pactflow_core::config::AppConfig;
use pactflow_core::emitter::FormalEmitter;
use pactflow_core::error::CliError;
use pactflow_core::scheduler::{Plan, PlanStep, Scheduler, TaskGraph};
use pactflow_core::validator::{ContractValidator, Violation};

use crate::commands::cli::{AuditArgs, EmitArgs, PlanArgs, PlanFormat, ValidateArgs};
use crate::utils::{load_state, print_json, read_json_object};

/// Exit code for an unsatisfied plan or failed validation.
pub const EXIT_UNSATISFIED: i32 = 2;

pub fn handle_plan(args: PlanArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let state = load_state(&args.state.state)?;
    let plan = Scheduler::new(cfg.scheduler.iteration_factor).plan(&state, &args.goals);

    match args.format {
        PlanFormat::Json => print_json(&plan)?,
        PlanFormat::Text => print!("{}", render_plan(&plan)),
    }
    Ok(if plan.is_satisfied() { 0 } else { EXIT_UNSATISFIED })
}

pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let executed = plan.task_order().len();
    let _ = writeln!(out, "plan: {} task(s), makespan {}h", executed, plan.makespan());
    for step in &plan.steps {
        match step {
            PlanStep::ExecuteTask {
                task_id,
                task_name,
                start_time,
                end_time,
                resources_used,
                ..
            } => {
                let _ = write!(out, "  [{start_time:>3} -> {end_time:>3}] {task_id} ({task_name})");
                if !resources_used.is_empty() {
                    let _ = write!(out, " using {}", resources_used.join(", "));
                }
                out.push('\n');
            }
            PlanStep::Error { message, time } => {
                let _ = writeln!(out, "  error at t={time}: {message}");
            }
        }
    }
    out
}

pub fn handle_validate(args: ValidateArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let state = load_state(&args.state.state)?;
    let task = state
        .task(&args.task)
        .ok_or_else(|| CliError::Command(format!("unknown task: {}", args.task)))?;
    let validator = ContractValidator::new(cfg.validator.strict_rules || args.strict);

    let mut found = validator.check_contract(task);
    if let Some(raw) = args.inputs.as_deref() {
        found.extend(validator.validate_inputs(task, &read_json_object(raw)?));
    }
    if let Some(raw) = args.outputs.as_deref() {
        found.extend(validator.validate_outputs(task, &read_json_object(raw)?));
    }

    if found.is_empty() {
        println!("{}: ok", task.id);
        return Ok(0);
    }
    print!("{}", render_violations(&task.id, &found));
    Ok(EXIT_UNSATISFIED)
}

pub fn handle_audit(args: AuditArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let state = load_state(&args.state.state)?;
    let validator = ContractValidator::new(cfg.validator.strict_rules || args.strict);
    let report = validator.audit(&state);
    print!("{}", render_audit(&report));

    let graph = TaskGraph::from_tasks(state.tasks())?;
    let stages = graph.validate().and_then(|_| graph.topological_sort());
    match &stages {
        Ok(stages) => {
            println!("dependency stages: {}", stages.len());
            for (idx, stage) in stages.iter().enumerate() {
                println!("  stage {idx}: {}", stage.join(", "));
            }
        }
        Err(err) => println!("dependency graph: {err}"),
    }

    Ok(
        if ContractValidator::is_execution_ready(&report) && stages.is_ok() {
            0
        } else {
            EXIT_UNSATISFIED
        },
    )
}

fn render_violations(task_id: &str, found: &[Violation]) -> String {
    let mut out = format!("{task_id}: {} violation(s)\n", found.len());
    for v in found {
        let _ = writeln!(out, "  - {v}");
    }
    out
}

pub fn render_audit(report: &BTreeMap<String, Vec<Violation>>) -> String {
    let mut out = String::new();
    for (task_id, found) in report {
        if found.is_empty() {
            let _ = writeln!(out, "{task_id}: ok");
        } else {
            out.push_str(&render_violations(task_id, found));
        }
    }
    let ready = ContractValidator::is_execution_ready(report);
    let _ = writeln!(out, "execution ready: {}", if ready { "yes" } else { "no" });
    out
}

pub fn handle_emit(args: EmitArgs) -> Result<i32, CliError> {
    let state = load_state(&args.state.state)?;
    let doc = FormalEmitter::new().emit(&state, &args.goals);

    match args.out_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join("domain.pddl"), &doc.domain)?;
            std::fs::write(dir.join("problem.pddl"), &doc.problem)?;
            tracing::info!(dir = %dir.display(), "formal documents written");
            println!("wrote {}", dir.join("domain.pddl").display());
            println!("wrote {}", dir.join("problem.pddl").display());
        }
        None => {
            println!("{}", doc.domain.trim_end());
            println!();
            println!("{}", doc.problem.trim_end());
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactflow_core::validator::ViolationKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_plan_lists_windows_and_errors() {
        let plan = Plan {
            steps: vec![
                PlanStep::ExecuteTask {
                    task_id: "auth_system".into(),
                    task_name: "User Authentication".into(),
                    duration: 8,
                    start_time: 0,
                    end_time: 8,
                    resources_used: vec!["developer".into()],
                },
                PlanStep::error("Deadlock: no executable tasks; remaining: x", 8),
            ],
        };

        assert_eq!(
            render_plan(&plan),
            "plan: 1 task(s), makespan 8h\n\
             \x20 [  0 ->   8] auth_system (User Authentication) using developer\n\
             \x20 error at t=8: Deadlock: no executable tasks; remaining: x\n"
        );
    }

    #[test]
    fn test_render_audit_marks_readiness() {
        let mut report = BTreeMap::new();
        report.insert("a".to_string(), Vec::new());
        report.insert(
            "b".to_string(),
            vec![Violation {
                task_id: "b".into(),
                field: "x".into(),
                kind: ViolationKind::MissingInput,
                message: "Required input 'x' missing for task b".into(),
            }],
        );

        let text = render_audit(&report);
        assert!(text.starts_with("a: ok\nb: 1 violation(s)\n"));
        assert!(text.contains("  - Required input 'x' missing for task b"));
        assert!(text.ends_with("execution ready: no\n"));
    }
}
