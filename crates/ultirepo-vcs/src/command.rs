//! Blocking `git` command runner with a timeout.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Failure of a single git invocation.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CommandError {
    #[error("failed to run git: {0}")]
    Io(#[from] io::Error),

    #[error("git {operation} timed out after {}s", timeout.as_secs())]
    TimedOut {
        operation: String,
        timeout: Duration,
    },

    #[error("git {operation} failed: {stderr}")]
    Failed { operation: String, stderr: String },
}

/// Builder for one `git` invocation.
///
/// The working directory is passed with `-C`, so the process's own current
/// directory never matters. Interactive credential prompts are disabled.
pub(crate) struct GitCommand {
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    timeout: Duration,
}

impl GitCommand {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            timeout,
        }
    }

    pub(crate) fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub(crate) fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn operation(&self) -> String {
        self.args
            .first()
            .map_or_else(|| "git".to_owned(), |a| a.to_string_lossy().into_owned())
    }

    /// Run the command and return its stdout.
    pub(crate) fn run(self) -> Result<String, CommandError> {
        let operation = self.operation();
        let mut cmd = Command::new("git");
        if let Some(dir) = &self.current_dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(&self.args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(target: "git", command = ?cmd, "Executing git command");
        let start = Instant::now();

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || read_pipe(stdout));
        let stderr_reader = thread::spawn(move || read_pipe(stderr));

        let deadline = start + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                // The process may already have exited between the two calls.
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(
                    target: "git",
                    operation = %operation,
                    timeout_secs = self.timeout.as_secs(),
                    "Git command timed out"
                );
                return Err(CommandError::TimedOut {
                    operation,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        tracing::debug!(
            target: "git",
            operation = %operation,
            elapsed_ms = start.elapsed().as_millis(),
            code = ?status.code(),
            "Git command finished"
        );

        if status.success() {
            Ok(stdout)
        } else {
            let stderr = stderr.trim().to_owned();
            tracing::debug!(
                target: "git",
                operation = %operation,
                %stderr,
                "Git command failed"
            );
            Err(CommandError::Failed { operation, stderr })
        }
    }
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    #[test]
    fn test_run_returns_stdout() {
        if !git_available() {
            return;
        }
        let out = GitCommand::new(Duration::from_secs(30))
            .arg("--version")
            .run()
            .unwrap();
        assert!(out.starts_with("git version"));
    }

    #[test]
    fn test_run_reports_failure_with_stderr() {
        if !git_available() {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();
        let err = GitCommand::new(Duration::from_secs(30))
            .current_dir(dir.path())
            .args(["rev-parse", "HEAD"])
            .run()
            .unwrap_err();

        match err {
            CommandError::Failed { operation, stderr } => {
                assert_eq!(operation, "rev-parse");
                assert!(!stderr.is_empty());
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_operation_name() {
        let cmd = GitCommand::new(Duration::from_secs(1)).args(["fetch", "--tags"]);
        assert_eq!(cmd.operation(), "fetch");
        assert_eq!(GitCommand::new(Duration::from_secs(1)).operation(), "git");
    }
}
