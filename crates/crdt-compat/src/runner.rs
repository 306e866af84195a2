//! Bounded subprocess execution.
//!
//! The child runs with stdin closed and both output pipes drained on reader
//! threads while the caller polls for exit. Past the deadline the child is
//! killed and reaped.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program} exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} wrote non-UTF-8 output")]
    InvalidUtf8 { program: String },
    #[error("failed to collect {program} output: {source}")]
    Io { program: String, source: io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandSpec {
    /// Splits `argv` into program and arguments.
    pub fn from_argv(argv: &[String], timeout: Duration) -> Result<Self, RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: None,
            timeout,
        })
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(program: &str, handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, RunError> {
    let io_err = |source| RunError::Io {
        program: program.to_string(),
        source,
    };
    handle
        .join()
        .map_err(|_| io_err(io::Error::other("pipe reader panicked")))?
        .map_err(io_err)
}

fn wait_with_deadline(child: &mut Child, cmd: &CommandSpec) -> Result<ExitStatus, RunError> {
    let deadline = Instant::now() + cmd.timeout;
    loop {
        let polled = child.try_wait().map_err(|source| RunError::Io {
            program: cmd.program.clone(),
            source,
        })?;
        if let Some(status) = polled {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            warn!(command = %cmd.display(), timeout = ?cmd.timeout, "killing timed out process");
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::Timeout {
                program: cmd.program.clone(),
                timeout: cmd.timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Runs the command and returns its stdout. A non-zero exit is reported
/// with the child's stderr and never parsed.
pub fn run(cmd: &CommandSpec) -> Result<String, RunError> {
    debug!(command = %cmd.display(), cwd = ?cmd.cwd, "spawning");
    let mut command = Command::new(&cmd.program);
    command
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &cmd.cwd {
        command.current_dir(cwd);
    }
    let mut child = command.spawn().map_err(|source| RunError::Spawn {
        program: cmd.program.clone(),
        source,
    })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let status = wait_with_deadline(&mut child, cmd)?;
    let stdout = collect(&cmd.program, stdout)?;
    let stderr = collect(&cmd.program, stderr)?;

    if !status.success() {
        return Err(RunError::NonZeroExit {
            program: cmd.program.clone(),
            status,
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }
    debug!(command = %cmd.display(), bytes = stdout.len(), "process finished");
    String::from_utf8(stdout).map_err(|_| RunError::InvalidUtf8 {
        program: cmd.program.clone(),
    })
}
