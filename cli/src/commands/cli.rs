use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Text,
    Json,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFormat {
    Text,
    Jsonl,
}

impl RunFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            RunFormat::Text => "text",
            RunFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pactflow",
    version,
    about = "Contract-enforced task planning and execution"
)]
pub struct Args {
    /// Config file to use instead of ~/.pactflow/config.toml or ./pactflow.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StateArgs {
    /// Planning state document (.json or .toml).
    #[arg(long)]
    pub state: PathBuf,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub state: StateArgs,

    /// Goal task id; repeat for several. Defaults to every task.
    #[arg(long = "goal", action = clap::ArgAction::Append)]
    pub goals: Vec<String>,

    #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub state: StateArgs,

    #[arg(long)]
    pub task: String,

    /// Inline JSON object or path to a JSON file.
    #[arg(long)]
    pub inputs: Option<String>,

    /// Inline JSON object or path to a JSON file.
    #[arg(long)]
    pub outputs: Option<String>,

    /// Treat unsupported validation rules as violations.
    #[arg(long)]
    pub strict: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AuditArgs {
    #[command(flatten)]
    pub state: StateArgs,

    #[arg(long)]
    pub strict: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EmitArgs {
    #[command(flatten)]
    pub state: StateArgs,

    #[arg(long = "goal", action = clap::ArgAction::Append)]
    pub goals: Vec<String>,

    /// Write domain.pddl and problem.pddl here instead of printing them.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecuteArgs {
    #[command(flatten)]
    pub state: StateArgs,

    #[arg(long)]
    pub task: String,

    /// Inline JSON object or path to a JSON file.
    #[arg(long)]
    pub inputs: Option<String>,

    /// Directory holding `<task_id>.<ext>` implementations.
    #[arg(long)]
    pub code_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub state: StateArgs,

    /// JSON object of task id -> inputs (inline or a file path).
    #[arg(long)]
    pub inputs: Option<String>,

    #[arg(long = "goal", action = clap::ArgAction::Append)]
    pub goals: Vec<String>,

    #[arg(long)]
    pub code_dir: Option<PathBuf>,

    #[arg(long)]
    pub max_concurrency: Option<usize>,

    #[arg(long, value_enum, default_value_t = RunFormat::Text)]
    pub format: RunFormat,

    /// Write the final run report as JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write the resulting planning state as JSON.
    #[arg(long)]
    pub save_state: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TaskArgs {
    /// Task store file; defaults to `store.path` from config.
    #[arg(long, global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
    },
    /// Import every task of a state document.
    Import {
        file: PathBuf,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TemplateArgs {
    /// Extra templates (JSON object of template id -> task).
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    #[command(subcommand)]
    pub command: TemplateCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplateCommand {
    List,
    Show {
        id: String,
    },
    Instantiate {
        template: String,

        /// Id of the new task; generated when omitted.
        #[arg(long)]
        id: Option<String>,

        /// Execution environment; defaults to `executor.default_environment`.
        #[arg(long)]
        environment: Option<String>,

        /// Save the new task into the task store.
        #[arg(long)]
        save: bool,

        #[arg(long)]
        store: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum UtilsCommand {
    /// List contract data types by category.
    Datatypes,
    /// List task statuses and their allowed transitions.
    Statuses,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute a greedy schedule.
    Plan(PlanArgs),
    /// Check inputs/outputs of one task against its contract.
    Validate(ValidateArgs),
    /// Validate every task contract of a state.
    Audit(AuditArgs),
    /// Emit a formal planning domain and problem.
    Emit(EmitArgs),
    /// Execute a single task through its backend.
    Execute(ExecuteArgs),
    /// Run the workflow to completion.
    Run(RunArgs),
    Task(TaskArgs),
    Template(TemplateArgs),
    #[command(subcommand)]
    Utils(UtilsCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_collects_repeated_goals() {
        let args = Args::try_parse_from([
            "pactflow", "plan", "--state", "s.json", "--goal", "a", "--goal", "b", "--format",
            "json",
        ])
        .unwrap();
        match args.command {
            Commands::Plan(plan) => {
                assert_eq!(plan.goals, vec!["a", "b"]);
                assert_eq!(plan.format, PlanFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args =
            Args::try_parse_from(["pactflow", "audit", "--state", "s.json", "--config", "c.toml"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn test_task_subcommands() {
        let args =
            Args::try_parse_from(["pactflow", "task", "show", "auth_system", "--store", "t.json"])
                .unwrap();
        match args.command {
            Commands::Task(TaskArgs {
                store,
                command: TaskCommand::Show { id },
            }) => {
                assert_eq!(store.as_deref(), Some("t.json"));
                assert_eq!(id, "auth_system");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_state() {
        assert!(Args::try_parse_from(["pactflow", "run"]).is_err());
    }
}
