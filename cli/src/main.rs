use clap::Parser;
use pactflow_cli::commands::{cli, execute, info, planning, task, template};
use pactflow_core::error::{CliError, StoreError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => pactflow_core::config::load_from_path(path),
        None => pactflow_core::config::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    dispatch(args.command, &cfg).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 2: plan unsatisfied / validation or execution failed (returned as Ok)
    // 11: config error
    // 20: io error
    // 30: invalid model or task record
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) => 20,
        CliError::Store(StoreError::Io(_)) => 20,
        CliError::Model(_) | CliError::Graph(_) | CliError::Store(_) => 30,
        CliError::Backend(_) | CliError::Command(_) | CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(cmd: cli::Commands, cfg: &pactflow_core::config::AppConfig) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Plan(args) => planning::handle_plan(args, cfg),
        cli::Commands::Validate(args) => planning::handle_validate(args, cfg),
        cli::Commands::Audit(args) => planning::handle_audit(args, cfg),
        cli::Commands::Emit(args) => planning::handle_emit(args),
        cli::Commands::Execute(args) => execute::handle_execute(args, cfg).await,
        cli::Commands::Run(args) => execute::handle_run(args, cfg).await,
        cli::Commands::Task(args) => task::handle_task(args, cfg),
        cli::Commands::Template(args) => template::handle_template(args, cfg),
        cli::Commands::Utils(cli::UtilsCommand::Datatypes) => {
            print!("{}", info::render_datatypes());
            Ok(0)
        }
        cli::Commands::Utils(cli::UtilsCommand::Statuses) => {
            print!("{}", info::render_statuses());
            Ok(0)
        }
    }
}

fn init_tracing(logging: &pactflow_core::config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(shellexpand::tilde(d).into_owned()),
            None => std::env::temp_dir().join("pactflow"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("pactflow.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
