use std::path::Path;
use std::sync::Arc;

use pactflow_core::config::AppConfig;
use pactflow_core::error::StoreError;
use pactflow_core::executor::{BackendRegistry, BlackBoxExecutor, CodeProvider, NativeBackend};
use pactflow_core::runtime::{OutputRendererPlugin, WorkflowRunner};
use pactflow_core::store::TaskStore;
use pactflow_core::validator::ContractValidator;

use crate::backend::ProcessBackend;
use crate::provider::FileCodeProvider;
use crate::renderers::{JsonlRendererPlugin, TextRendererPlugin};
use crate::store::JsonFileTaskStore;

/// Native functions go in `native`; its environment tag should come from
/// `executor.native_environment`. Process environments are registered after
/// it and win on overlap.
pub fn build_backends(cfg: &AppConfig, native: NativeBackend) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(native));
    if cfg.executor.process.enabled {
        registry.register(Arc::new(ProcessBackend::new(cfg.executor.process.clone())));
    }
    registry
}

pub fn build_code_provider(cfg: &AppConfig, code_dir: Option<&Path>) -> Option<Arc<dyn CodeProvider>> {
    let dir = code_dir?;
    let provider = cfg
        .executor
        .process
        .interpreters
        .iter()
        .fold(FileCodeProvider::new(dir), |p, (env, interp)| {
            p.with_extension(env.clone(), interp.extension.clone())
        });
    Some(Arc::new(provider))
}

pub fn build_executor(
    cfg: &AppConfig,
    native: NativeBackend,
    code_dir: Option<&Path>,
) -> BlackBoxExecutor {
    let mut executor = BlackBoxExecutor::new(build_backends(cfg, native))
        .with_validator(ContractValidator::new(cfg.validator.strict_rules));
    if let Some(provider) = build_code_provider(cfg, code_dir) {
        executor = executor.with_provider(provider);
    }
    executor
}

pub fn build_runner(
    cfg: &AppConfig,
    executor: BlackBoxExecutor,
    render_format: Option<&str>,
) -> WorkflowRunner {
    let runner = WorkflowRunner::new(executor, cfg.runtime.max_concurrency);
    match render_format {
        Some(format) => runner.with_renderer(build_renderer(format)),
        None => runner,
    }
}

pub fn build_renderer(format: &str) -> Arc<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        "ascii" => Arc::new(TextRendererPlugin::new(true)),
        // anything else renders as text
        _ => Arc::new(TextRendererPlugin::new(false)),
    }
}

pub fn build_store(cfg: &AppConfig) -> Result<Box<dyn TaskStore>, StoreError> {
    Ok(Box::new(JsonFileTaskStore::open(&cfg.store.path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_backends_routes_native_and_process() {
        let cfg = AppConfig::default();
        let registry = build_backends(&cfg, NativeBackend::default());
        assert_eq!(
            registry.environments(),
            vec!["bash", "native", "node", "python"]
        );
    }

    #[test]
    fn test_disabled_process_backend_leaves_native_only() {
        let mut cfg = AppConfig::default();
        cfg.executor.process.enabled = false;
        let registry = build_backends(&cfg, NativeBackend::default());
        assert_eq!(registry.environments(), vec!["native"]);
        assert!(registry.resolve("python").is_err());
    }

    #[test]
    fn test_build_renderer_formats() {
        assert_eq!(build_renderer("jsonl").format(), "jsonl");
        assert_eq!(build_renderer("text").format(), "text");
        assert_eq!(build_renderer("whatever").format(), "text");
    }

    #[test]
    fn test_code_provider_only_with_dir() {
        let cfg = AppConfig::default();
        assert!(build_code_provider(&cfg, None).is_none());
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            build_code_provider(&cfg, Some(dir.path())).unwrap().name(),
            "file"
        );
    }

    #[test]
    fn test_build_store_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.store.path = dir.path().join("tasks.json").to_string_lossy().into_owned();
        let store = build_store(&cfg).unwrap();
        assert_eq!(store.name(), "json-file");
        assert!(store.list().unwrap().is_empty());
    }
}
