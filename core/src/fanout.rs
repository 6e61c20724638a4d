//! Concurrent replication of a single module invocation.

use crate::error::{ModuleError, ModuleResult};
use crate::runner::{ExecutionResult, ModuleArgs, ModuleRunner};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Run `name` on `workers` concurrent tasks and merge their output.
///
/// Every worker receives the same arguments. Output lines are prefixed with
/// the worker number and ordered by it; the merged result is successful only
/// if every worker succeeded.
pub async fn run_fanout(
    runner: Arc<dyn ModuleRunner>,
    name: &str,
    args: &ModuleArgs,
    workers: usize,
) -> ModuleResult<ExecutionResult> {
    let module = runner
        .module(name)
        .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
    let missing = module.missing_required(args);
    if !missing.is_empty() {
        return Err(ModuleError::MissingArguments {
            module: name.to_string(),
            missing,
        });
    }

    let workers = workers.max(1);
    info!(module = name, workers, "fanning out module");
    let started = Instant::now();

    let outputs: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::with_capacity(workers)));
    let mut handles = Vec::with_capacity(workers);

    for worker in 1..=workers {
        let runner = Arc::clone(&runner);
        let outputs = Arc::clone(&outputs);
        let args = args.clone();
        let name = name.to_string();

        handles.push(tokio::spawn(async move {
            let (line, ok) = match runner.execute(&name, &args).await {
                Ok(result) => (
                    format!("[worker {worker}] {}", result.output.trim_end()),
                    result.success,
                ),
                Err(e) => (format!("[worker {worker}] error: {e}"), false),
            };
            outputs.lock().await.push((worker, line));
            ok
        }));
    }

    let mut success = true;
    for handle in handles {
        match handle.await {
            Ok(ok) => success &= ok,
            Err(e) => {
                warn!(error = %e, "fan-out worker panicked");
                success = false;
            }
        }
    }

    let mut lines = std::mem::take(&mut *outputs.lock().await);
    lines.sort_by_key(|(worker, _)| *worker);
    let output = lines
        .into_iter()
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ExecutionResult {
        success,
        output,
        error: String::new(),
        exit_code: i32::from(!success),
        duration: started.elapsed(),
    })
}
