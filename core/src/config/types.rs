use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scheduler::DEFAULT_ITERATION_FACTOR;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory`.
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "pactflow_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for log files. Defaults to `~/.pactflow/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Rules outside the supported grammar become violations instead of passing.
    #[serde(default)]
    pub strict_rules: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_iteration_factor")]
    pub iteration_factor: usize,
}

fn default_iteration_factor() -> usize {
    DEFAULT_ITERATION_FACTOR
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            iteration_factor: default_iteration_factor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Environment given to tasks created from templates.
    #[serde(default = "default_environment")]
    pub default_environment: String,

    /// Environment tag served by the in-process backend.
    #[serde(default = "default_native_environment")]
    pub native_environment: String,

    #[serde(default)]
    pub process: ProcessConfig,
}

fn default_environment() -> String {
    "python".to_string()
}

fn default_native_environment() -> String {
    crate::executor::NATIVE_ENVIRONMENT.to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_environment: default_environment(),
            native_environment: default_native_environment(),
            process: ProcessConfig::default(),
        }
    }
}

/// Wrapper script placed around generated code so it can be called with JSON on stdin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessKind {
    /// Code runs as-is and must print its own JSON result.
    #[default]
    None,
    Python,
    Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// File extension of the written source file, without the dot.
    pub extension: String,
    #[serde(default)]
    pub harness: HarnessKind,
}

impl InterpreterConfig {
    fn new(program: &str, extension: &str, harness: HarnessKind) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            extension: extension.to_string(),
            harness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_process_enabled")]
    pub enabled: bool,

    /// environment tag -> interpreter
    #[serde(default = "default_interpreters")]
    pub interpreters: BTreeMap<String, InterpreterConfig>,

    /// Per-call deadline; `None` waits forever.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,

    /// Pass the parent environment through instead of only `PATH`.
    #[serde(default)]
    pub inherit_env: bool,
}

fn default_process_enabled() -> bool {
    true
}

fn default_interpreters() -> BTreeMap<String, InterpreterConfig> {
    let mut m = BTreeMap::new();
    m.insert(
        "python".to_string(),
        InterpreterConfig::new("python3", "py", HarnessKind::Python),
    );
    m.insert(
        "node".to_string(),
        InterpreterConfig::new("node", "js", HarnessKind::Node),
    );
    m.insert(
        "bash".to_string(),
        InterpreterConfig::new("bash", "sh", HarnessKind::None),
    );
    m
}

fn default_timeout_ms() -> Option<u64> {
    Some(60_000)
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            enabled: default_process_enabled(),
            interpreters: default_interpreters(),
            timeout_ms: default_timeout_ms(),
            inherit_env: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    num_cpus::get()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON task store; `~` is expanded by the caller.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "~/.pactflow/tasks.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}
