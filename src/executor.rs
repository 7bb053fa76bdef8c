//! Compile-and-run pipeline for one submission.
//!
//! Created -> WorkspaceReady -> Compiled -> Ran -> Finished, where any failure
//! jumps straight to Finished. The workspace is removed on every path.

use crate::backend::LanguageBackend;
use crate::config::Config;
use crate::error::Result;
use crate::result::{ExecutionResult, UNKNOWN_COMPILATION_ERROR};
use crate::runner::{self, ProcessOutcome};
use crate::workspace::Workspace;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, Instrument};

/// Runs submissions against one language backend.
///
/// Cheap to clone; clones share the admission limit.
#[derive(Debug, Clone)]
pub struct Executor {
    config: Arc<Config>,
    backend: Arc<dyn LanguageBackend>,
    permits: Option<Arc<Semaphore>>,
}

impl Executor {
    pub fn new(config: Arc<Config>, backend: Arc<dyn LanguageBackend>) -> Self {
        let permits = config
            .max_concurrent
            .map(|n| Arc::new(Semaphore::new(n.get())));
        Self {
            config,
            backend,
            permits,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &dyn LanguageBackend {
        self.backend.as_ref()
    }

    /// Compile and run `code`. Workspace failures become `InfrastructureError`.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        match self.try_execute(code).await {
            Ok(result) => result,
            Err(e) => ExecutionResult::InfrastructureError(e.to_string()),
        }
    }

    /// Like [`Executor::execute`], but reports workspace failures as `Err`
    /// so callers can tell them apart from outcomes of the user's code.
    pub async fn try_execute(&self, code: &str) -> Result<ExecutionResult> {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = match &self.permits {
            Some(permits) => permits.clone().acquire_owned().await.ok(),
            None => None,
        };

        let workspace = Workspace::create(&self.config.build_root).await?;
        let span = info_span!("submission", workspace = %workspace.id(), language = self.backend.name());

        async move {
            let result = match self.prepare(&workspace, code).await {
                Ok(()) => Ok(self.compile_and_run(&workspace).await),
                Err(e) => Err(e),
            };
            workspace.destroy().await;
            debug!("Finished");
            result
        }
        .instrument(span)
        .await
    }

    async fn prepare(&self, workspace: &Workspace, code: &str) -> Result<()> {
        if let Some(manifest) = self.backend.manifest(&self.config.packages) {
            workspace.write(&manifest.filename, &manifest.contents).await?;
        }
        workspace.write(self.backend.source_filename(), code).await?;
        debug!("WorkspaceReady");
        Ok(())
    }

    async fn compile_and_run(&self, workspace: &Workspace) -> ExecutionResult {
        let compile = self.backend.compile_command(workspace.path());
        let outcome = runner::run(&compile, self.config.compile_timeout()).await;
        if let Some(result) = self.classify_compile(outcome) {
            info!(status = result.status(), "Compilation did not succeed");
            return result;
        }
        debug!("Compiled");

        let run = self.backend.run_command(workspace.path());
        let outcome = runner::run(&run, self.config.timeout()).await;
        let result = self.classify_run(outcome);
        info!(status = result.status(), "Ran");
        result
    }

    /// `None` means the build succeeded and the run phase should follow.
    fn classify_compile(&self, outcome: ProcessOutcome) -> Option<ExecutionResult> {
        if outcome.failed_to_start {
            return Some(ExecutionResult::InfrastructureError(
                "Compilation process failed to start".to_string(),
            ));
        }
        if outcome.timed_out {
            return Some(ExecutionResult::TimeoutError(format!(
                "Compilation exceeded {} seconds timeout",
                self.config.compile_timeout_secs
            )));
        }
        if outcome.exit_code == Some(0) {
            return None;
        }
        Some(ExecutionResult::CompilationError(compiler_message(
            &outcome.stdout,
            &outcome.stderr,
        )))
    }

    fn classify_run(&self, outcome: ProcessOutcome) -> ExecutionResult {
        if outcome.timed_out {
            ExecutionResult::TimeoutError(format!(
                "Execution exceeded {} seconds timeout",
                self.config.timeout_secs
            ))
        } else if outcome.failed_to_start {
            ExecutionResult::InfrastructureError("Runtime process failed to start".to_string())
        } else if outcome.exit_code == Some(0) {
            ExecutionResult::Success(outcome.stdout)
        } else {
            // Runtime failures surface stderr only.
            ExecutionResult::RuntimeError(outcome.stderr)
        }
    }
}

/// Non-blank lines of stdout then stderr, joined with `\n`.
fn compiler_message(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout
        .split('\n')
        .chain(stderr.split('\n'))
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.is_empty() {
        UNKNOWN_COMPILATION_ERROR.to_string()
    } else {
        lines.join("\n")
    }
}
