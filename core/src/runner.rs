use crate::error::{ModuleError, ModuleResult};
use crate::manager::ModuleInfo;
use crate::metadata::ModuleKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Named arguments passed to a module. Each entry is exported to the
/// subprocess as `ARG_<UPPERCASE KEY>`.
pub type ModuleArgs = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn failed(exit_code: i32, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            exit_code,
            ..Self::default()
        }
    }
}

/// Executes modules by name.
///
/// The shell only talks to modules through this trait, so tests can swap in
/// an in-memory runner.
#[async_trait]
pub trait ModuleRunner: Send + Sync {
    /// Look up a module, whether or not it loaded cleanly.
    fn module(&self, name: &str) -> Option<ModuleInfo>;

    /// All known modules, sorted by name.
    fn modules(&self) -> Vec<ModuleInfo>;

    /// Re-scan the module source. Returns the number of modules found.
    fn refresh(&self) -> ModuleResult<usize>;

    async fn execute(&self, name: &str, args: &ModuleArgs) -> ModuleResult<ExecutionResult>;

    fn contains(&self, name: &str) -> bool {
        self.module(name).is_some()
    }

    /// Scaffold a new module. Read-only sources refuse.
    fn create(&self, _name: &str, _kind: &ModuleKind) -> ModuleResult<PathBuf> {
        Err(ModuleError::Unsupported("creating modules"))
    }

    /// Files inside a module, relative to its directory.
    fn files(&self, _name: &str) -> ModuleResult<Vec<String>> {
        Err(ModuleError::Unsupported("listing module files"))
    }

    fn delete(&self, _name: &str) -> ModuleResult<PathBuf> {
        Err(ModuleError::Unsupported("deleting modules"))
    }
}

/// Run `interpreter script` inside `workdir`, capturing its output.
pub(crate) async fn run_script(
    interpreter: &str,
    script: &Path,
    workdir: &Path,
    args: &ModuleArgs,
) -> ModuleResult<ExecutionResult> {
    let started = Instant::now();

    let mut cmd = Command::new(interpreter);
    cmd.arg(script)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in args {
        cmd.env(format!("ARG_{}", key.to_uppercase()), value);
    }

    debug!(interpreter, script = %script.display(), "spawning module");
    let output = cmd.output().await.map_err(|source| ModuleError::Spawn {
        interpreter: interpreter.to_string(),
        source,
    })?;

    Ok(ExecutionResult {
        success: output.status.success(),
        output: String::from_utf8_lossy(&output.stdout).into_owned(),
        error: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
        duration: started.elapsed(),
    })
}
