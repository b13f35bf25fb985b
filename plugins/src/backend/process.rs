//! Sandboxed subprocess backend.
//!
//! Each call gets a fresh temp directory holding `task.<ext>`. The validated
//! inputs go to the child's stdin as one JSON object and the last non-empty
//! stdout line is read back as the JSON result. With a harness configured the
//! generated code only has to define the entry point; the harness does the
//! stdin/stdout plumbing.

use async_trait::async_trait;
use pactflow_core::config::{HarnessKind, InterpreterConfig, ProcessConfig};
use pactflow_core::error::BackendError;
use pactflow_core::executor::{BackendOutput, BackendRequest, ExecutorBackend};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Exit code the harnesses use when the entry point is not defined.
pub const MISSING_ENTRY_EXIT: i32 = 3;

const ENTRY_PLACEHOLDER: &str = "__PACTFLOW_ENTRY__";

const PYTHON_HARNESS: &str = r#"

if __name__ == "__main__":
    import json as _pf_json
    import sys as _pf_sys

    if not callable(globals().get("__PACTFLOW_ENTRY__")):
        print("entry point '__PACTFLOW_ENTRY__' is not defined", file=_pf_sys.stderr)
        _pf_sys.exit(3)
    _pf_raw = _pf_sys.stdin.read()
    _pf_inputs = _pf_json.loads(_pf_raw) if _pf_raw.strip() else {}
    _pf_result = __PACTFLOW_ENTRY__(_pf_inputs)
    print(_pf_json.dumps(_pf_result, default=str))
"#;

const NODE_HARNESS: &str = r#"

;(function () {
  if (typeof __PACTFLOW_ENTRY__ !== "function") {
    process.stderr.write("entry point '__PACTFLOW_ENTRY__' is not defined\n");
    process.exit(3);
  }
  const raw = require("fs").readFileSync(0, "utf8");
  const inputs = raw.trim() ? JSON.parse(raw) : {};
  Promise.resolve(__PACTFLOW_ENTRY__(inputs)).then(
    (result) => process.stdout.write(JSON.stringify(result === undefined ? null : result) + "\n"),
    (err) => {
      process.stderr.write(String((err && err.stack) || err) + "\n");
      process.exit(1);
    }
  );
})();
"#;

pub struct ProcessBackend {
    config: ProcessConfig,
}

impl ProcessBackend {
    pub fn new(config: ProcessConfig) -> Self {
        Self { config }
    }

    pub fn interpreter(&self, environment: &str) -> Option<&InterpreterConfig> {
        self.config.interpreters.get(environment)
    }

    fn command(&self, interpreter: &InterpreterConfig, request: &BackendRequest) -> Command {
        let mut cmd = Command::new(&interpreter.program);
        cmd.args(&interpreter.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !self.config.inherit_env {
            cmd.env_clear();
            if let Some(path) = std::env::var_os("PATH") {
                cmd.env("PATH", path);
            }
        }
        cmd.env("PACTFLOW_TASK_ID", &request.task_id)
            .env("PACTFLOW_ENTRY_POINT", &request.entry_point);
        cmd
    }
}

/// Source file contents: the code, followed by the harness if any.
pub fn render_source(harness: HarnessKind, code: &str, entry_point: &str) -> String {
    let tail = match harness {
        HarnessKind::None => return code.to_string(),
        HarnessKind::Python => PYTHON_HARNESS,
        HarnessKind::Node => NODE_HARNESS,
    };
    let mut source = String::with_capacity(code.len() + tail.len());
    source.push_str(code.trim_end());
    source.push('\n');
    source.push_str(&tail.replace(ENTRY_PLACEHOLDER, entry_point));
    source
}

/// Last non-empty stdout line is the result; everything else becomes trace.
fn parse_output(stdout: &str, stderr: &str) -> Result<BackendOutput, BackendError> {
    let mut lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    let last = lines
        .pop()
        .ok_or_else(|| BackendError::InvalidOutput("no output on stdout".to_string()))?;
    let value: Value = serde_json::from_str(last.trim())
        .map_err(|e| BackendError::InvalidOutput(format!("{e}: {last}")))?;

    let mut trace: Vec<String> = lines.iter().map(|l| format!("stdout: {l}")).collect();
    trace.extend(
        stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| format!("stderr: {l}")),
    );
    Ok(BackendOutput { value, trace })
}

#[async_trait]
impl ExecutorBackend for ProcessBackend {
    fn name(&self) -> &str {
        "process"
    }

    fn environments(&self) -> Vec<String> {
        if !self.config.enabled {
            return Vec::new();
        }
        self.config.interpreters.keys().cloned().collect()
    }

    async fn run(&self, request: BackendRequest) -> Result<BackendOutput, BackendError> {
        let interpreter = self
            .interpreter(&request.environment)
            .ok_or_else(|| BackendError::UnsupportedEnvironment(request.environment.clone()))?;
        let code = request
            .code
            .as_deref()
            .ok_or_else(|| BackendError::MissingCode(request.task_id.clone()))?;

        let workdir = tempfile::Builder::new().prefix("pactflow-").tempdir()?;
        let script = workdir.path().join(format!("task.{}", interpreter.extension));
        tokio::fs::write(
            &script,
            render_source(interpreter.harness, code, &request.entry_point),
        )
        .await?;

        let mut cmd = self.command(interpreter, &request);
        cmd.arg(&script).current_dir(workdir.path());
        tracing::debug!(
            task_id = %request.task_id,
            program = %interpreter.program,
            script = %script.display(),
            "spawning implementation"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| BackendError::Spawn(format!("{}: {e}", interpreter.program)))?;

        let payload = serde_json::to_vec(&request.inputs)
            .map_err(|e| BackendError::Failed(format!("failed to encode inputs: {e}")))?;
        let stdin = child.stdin.take();
        let feeding = async move {
            if let Some(mut stdin) = stdin {
                // 子进程可能不读 stdin 就退出：忽略 BrokenPipe
                match stdin.write_all(&payload).await {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok(())
        };
        // 写 stdin 与读取输出并发进行，超时同时覆盖两者
        let exchange = async {
            let (fed, output) = tokio::join!(feeding, child.wait_with_output());
            fed?;
            output
        };
        let output = match self.config.timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), exchange)
                .await
                .map_err(|_| BackendError::Timeout(ms))??,
            None => exchange.await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            if code == MISSING_ENTRY_EXIT && interpreter.harness != HarnessKind::None {
                return Err(BackendError::MissingEntryPoint(request.entry_point.clone()));
            }
            tracing::warn!(task_id = %request.task_id, code, "implementation exited with failure");
            return Err(BackendError::ProcessExit {
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        parse_output(&stdout, &stderr)
    }
}
