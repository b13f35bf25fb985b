use pactflow_core::config::AppConfig;
use pactflow_core::error::CliError;
use pactflow_core::executor::NativeBackend;
use pactflow_core::runtime::shared;
use pactflow_plugins::factory;

use crate::commands::cli::{ExecuteArgs, RunArgs};
use crate::commands::planning::EXIT_UNSATISFIED;
use crate::utils::{load_state, print_json, read_optional_object, read_task_inputs, write_json};

fn native_backend(cfg: &AppConfig) -> NativeBackend {
    NativeBackend::new(cfg.executor.native_environment.clone())
}

pub async fn handle_execute(args: ExecuteArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let state = load_state(&args.state.state)?;
    let mut task = state
        .task(&args.task)
        .cloned()
        .ok_or_else(|| CliError::Command(format!("unknown task: {}", args.task)))?;
    let inputs = read_optional_object(args.inputs.as_deref())?;

    let executor = factory::build_executor(cfg, native_backend(cfg), args.code_dir.as_deref());
    let (_, result) = executor.run(&mut task, inputs).await;

    print_json(&result)?;
    Ok(if result.success { 0 } else { EXIT_UNSATISFIED })
}

pub async fn handle_run(args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let mut cfg = cfg.clone();
    if let Some(n) = args.max_concurrency.filter(|n| *n > 0) {
        cfg.runtime.max_concurrency = n;
    }

    let state = shared(load_state(&args.state.state)?);
    let inputs = read_task_inputs(args.inputs.as_deref())?;

    let executor = factory::build_executor(&cfg, native_backend(&cfg), args.code_dir.as_deref());
    let runner = factory::build_runner(&cfg, executor, Some(args.format.as_str()));
    let report = runner.run(state.clone(), &args.goals, &inputs).await?;

    if let Some(path) = args.report.as_deref() {
        write_json(path, &report)?;
    }
    if let Some(path) = args.save_state.as_deref() {
        let document = state
            .lock()
            .map(|st| st.to_document())
            .unwrap_or_else(|e| e.into_inner().to_document());
        write_json(path, &document)?;
    }

    Ok(if report.is_success() { 0 } else { EXIT_UNSATISFIED })
}
