//! Runs one external process under a wall-clock deadline.

use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// argv plus optional working directory for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// What happened to one spawned process.
///
/// Output of a timed-out process is discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub failed_to_start: bool,
}

impl ProcessOutcome {
    fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    fn failed_to_start(reason: String) -> Self {
        Self {
            stderr: reason,
            failed_to_start: true,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && !self.failed_to_start && self.exit_code == Some(0)
    }
}

/// Run `spec` to completion, or kill it once `deadline` elapses.
///
/// Both pipes are drained while waiting for exit, and the deadline covers the
/// drain too: a grandchild holding a pipe open counts as still running.
pub async fn run(spec: &CommandSpec, deadline: Duration) -> ProcessOutcome {
    info!(program = %spec.program, args = ?spec.args, cwd = ?spec.cwd, "Running command");

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    #[cfg(unix)]
    command.process_group(0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(program = %spec.program, error = %e, "Failed to spawn");
            return ProcessOutcome::failed_to_start(e.to_string());
        }
    };
    let pid = child.id();
    debug!(pid = ?pid, "Child spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let capture = async {
        let (status, stdout, stderr) = tokio::join!(child.wait(), drain(stdout), drain(stderr));
        (status, stdout, stderr)
    };

    let outcome = match tokio::time::timeout(deadline, capture).await {
        Ok((Ok(status), stdout, stderr)) => {
            let outcome = ProcessOutcome {
                exit_code: status.code(),
                stdout,
                stderr,
                timed_out: false,
                failed_to_start: false,
            };
            info!(
                exit_code = ?outcome.exit_code,
                stdout_len = outcome.stdout.len(),
                stderr_len = outcome.stderr.len(),
                "Command finished"
            );
            outcome
        }
        Ok((Err(e), stdout, stderr)) => {
            warn!(error = %e, "Failed to wait for child");
            ProcessOutcome {
                exit_code: None,
                stdout,
                stderr,
                timed_out: false,
                failed_to_start: false,
            }
        }
        Err(_) => {
            warn!(program = %spec.program, deadline = ?deadline, "Deadline exceeded, killing");
            terminate(&mut child, pid).await;
            return ProcessOutcome::timed_out();
        }
    };

    // Anything the child left behind in its group (detached background jobs
    // that closed their pipes) must not outlive the run.
    kill_group(pid);
    outcome
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!(error = %e, "Pipe read failed");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// SIGKILL the process group led by `pid`. An already empty group is fine.
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = pid {
            match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => debug!(pid, error = %e, "killpg failed"),
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Kill the child's whole process group, then kill and reap the child itself.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill failed");
    }
}

/// Poll until `pid` is gone from the process table (zombies count as gone).
#[cfg(all(test, unix))]
pub(crate) async fn process_exits_within(pid: i32, limit: Duration) -> bool {
    fn alive(pid: i32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        if kill(Pid::from_raw(pid), None).is_err() {
            return false;
        }
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(')')
                .map_or(true, |(_, rest)| !rest.trim_start().starts_with('Z')),
            Err(_) => !cfg!(target_os = "linux"),
        }
    }

    let started = std::time::Instant::now();
    while alive(pid) {
        if started.elapsed() >= limit {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    true
}
