use anyhow::Context;
use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default pactflow data directory: ~/.pactflow
pub fn get_pactflow_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".pactflow"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.pactflow/config.toml (highest)
    let data_dir = get_pactflow_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./pactflow.toml (current directory)
    let local_config = Path::new("pactflow.toml");

    let mut cfg = if user_config.exists() {
        read_config(&user_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg.logging.file && is_unset(cfg.logging.directory.as_deref()) {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load an explicit config file. Env overrides still apply.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let mut cfg = read_config(path)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str::<AppConfig>(&s).with_context(|| format!("invalid config {}", path.display()))
}

fn is_unset(value: Option<&str>) -> bool {
    value.map(|s| s.trim().is_empty()).unwrap_or(true)
}

/// Environment variable overrides (Priority 0: highest)
pub fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(v) = env_value("PACTFLOW_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_value("PACTFLOW_STRICT_RULES") {
        cfg.validator.strict_rules = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }
    if let Some(v) = env_value("PACTFLOW_MAX_CONCURRENCY") {
        match v.parse::<usize>() {
            Ok(n) if n > 0 => cfg.runtime.max_concurrency = n,
            _ => tracing::warn!(value = %v, "ignoring invalid PACTFLOW_MAX_CONCURRENCY"),
        }
    }
    if let Some(v) = env_value("PACTFLOW_STORE_PATH") {
        cfg.store.path = v;
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessKind;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pactflow.toml");
        std::fs::write(
            &path,
            r#"
[validator]
strict_rules = true

[executor.process]
timeout_ms = 500

[executor.process.interpreters.ruby]
program = "ruby"
extension = "rb"
"#,
        )
        .unwrap();

        let cfg = read_config(&path).unwrap();
        assert!(cfg.validator.strict_rules);
        assert_eq!(cfg.scheduler.iteration_factor, 2);
        assert_eq!(cfg.executor.process.timeout_ms, Some(500));
        assert_eq!(
            cfg.executor.process.interpreters["ruby"].harness,
            HarnessKind::None
        );
        assert_eq!(cfg.executor.native_environment, "native");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[scheduler\n").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_default_interpreters() {
        let cfg = AppConfig::default();
        let python = &cfg.executor.process.interpreters["python"];
        assert_eq!(python.program, "python3");
        assert_eq!(python.harness, HarnessKind::Python);
        assert!(cfg.runtime.max_concurrency >= 1);
    }
}
