//! Bounded execution of external toolchain processes.
//!
//! Every toolchain invocation goes through [`ProcessRunner::execute`]: one
//! child per call, captured stdout/stderr, a wall-clock timeout enforced by
//! racing exit-wait against a deadline, and classified failures. No retries
//! happen here; callers decide whether an invocation is worth repeating.

use crate::error::ExecError;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between exit checks while the timeout countdown runs.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stderr fragments that indicate an OS-level permission denial.
const PERMISSION_PHRASES: &[&str] = &[
    "permission denied",
    "operation not permitted",
    "access is denied",
];

/// Immutable record of one finished toolchain invocation.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Program that was invoked.
    pub program: String,
    /// Arguments it was invoked with.
    pub args: Vec<String>,
    /// Exit code (None if the process was killed by a signal).
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandResult {
    /// True if the process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands with captured output and an enforced timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    default_timeout: Duration,
}

impl ProcessRunner {
    /// Default wall-clock budget for a toolchain invocation.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// Run `program` with `args`, using the runner's default timeout.
    pub fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<CommandResult, ExecError> {
        self.execute(program, args, working_dir, env, self.default_timeout)
    }

    /// Run `program` with `args` and wait at most `timeout` for it to exit.
    ///
    /// The exit-wait and the timeout countdown race; if the deadline wins the
    /// child is killed and reaped before `ExecError::Timeout` is returned, so
    /// the call never outlives `timeout` by more than teardown latency.
    pub fn execute(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }
        for (key, value) in env {
            command.env(key, value);
        }

        tracing::debug!(program, ?args, ?working_dir, "spawning toolchain process");

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExecError::ToolNotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ExecError::PermissionDenied {
                program: program.to_string(),
                detail: e.to_string(),
            },
            _ => ExecError::Spawn {
                program: program.to_string(),
                source: e,
            },
        })?;

        // Drain both pipes off-thread so a chatty child can't fill a pipe
        // buffer and deadlock the exit poll below.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = match wait_with_deadline(&mut child, timeout) {
            Some(status) => status,
            None => {
                kill_and_reap(&mut child);
                // Readers finish once the pipes close with the child.
                let _ = join_reader(stdout_reader);
                let _ = join_reader(stderr_reader);
                return Err(ExecError::Timeout {
                    program: program.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        let result = CommandResult {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            exit_code: status.code(),
            stdout,
            stderr,
        };

        if result.success() {
            return Ok(result);
        }

        let stderr_lower = result.stderr.to_lowercase();
        if PERMISSION_PHRASES.iter().any(|p| stderr_lower.contains(p)) {
            return Err(ExecError::PermissionDenied {
                program: program.to_string(),
                detail: result.stderr.trim().to_string(),
            });
        }

        Err(ExecError::ExecutionFailed {
            program: program.to_string(),
            code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

/// Poll for exit until `timeout` elapses. Returns None on deadline.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    return None;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                tracing::warn!(error = %e, "try_wait failed; treating as still running");
                if Instant::now() >= deadline {
                    return None;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

/// Kill a child and wait for it so no zombie is left behind.
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_pipe_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut r| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ProcessRunner {
        ProcessRunner::default()
    }

    #[test]
    fn captures_stdout_on_success() {
        let result = runner()
            .run("echo", &["hello"], None, &HashMap::new())
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.program, "echo");
    }

    #[test]
    fn nonzero_exit_is_execution_failed() {
        let err = runner()
            .run("sh", &["-c", "echo oops >&2; exit 3"], None, &HashMap::new())
            .unwrap_err();

        match err {
            ExecError::ExecutionFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[test]
    fn permission_phrasing_is_classified() {
        let err = runner()
            .run(
                "sh",
                &["-c", "echo 'rm: cannot remove: Permission denied' >&2; exit 1"],
                None,
                &HashMap::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ExecError::PermissionDenied { .. }));
    }

    #[test]
    fn missing_program_is_tool_not_found() {
        let err = runner()
            .run("devsweep-no-such-tool-xyz", &[], None, &HashMap::new())
            .unwrap_err();

        assert!(matches!(err, ExecError::ToolNotFound { .. }));
    }

    #[test]
    fn timeout_kills_the_child_within_slack() {
        let start = Instant::now();
        let err = runner()
            .execute(
                "sleep",
                &["10"],
                None,
                &HashMap::new(),
                Duration::from_millis(300),
            )
            .unwrap_err();

        assert!(matches!(err, ExecError::Timeout { .. }));
        // Teardown slack: well under the 10s the child wanted.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn respects_working_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = runner()
            .run("pwd", &[], Some(tmp.path()), &HashMap::new())
            .unwrap();

        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        let expected = std::fs::canonicalize(tmp.path()).unwrap();
        assert_eq!(reported, expected);
    }

    #[test]
    fn passes_environment() {
        let mut env = HashMap::new();
        env.insert("DEVSWEEP_TEST_VAR".to_string(), "marker-value".to_string());

        let result = runner()
            .run("sh", &["-c", "echo $DEVSWEEP_TEST_VAR"], None, &env)
            .unwrap();

        assert_eq!(result.stdout.trim(), "marker-value");
    }

    #[test]
    fn large_output_does_not_deadlock() {
        // More than a pipe buffer's worth of stdout.
        let result = runner()
            .run(
                "sh",
                &["-c", "yes x | head -c 200000"],
                None,
                &HashMap::new(),
            )
            .unwrap();

        assert!(result.stdout.len() >= 200_000);
    }
}
