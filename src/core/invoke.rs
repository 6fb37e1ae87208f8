//! External process invocation.
//!
//! The `op` CLI is an external collaborator: this module builds plain-data
//! invocations (argument vector plus environment overlay), spawns the
//! process synchronously, captures its output in full, and maps the exit
//! status into either the stdout text or a `ToolError`.
//!
//! Execution limits (wall-clock timeout, output size) are opt-in and have no
//! default value. Without limits the call blocks until the process exits.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Result, ToolError};

/// Environment variable to explicitly set the path of the `op` binary.
pub const OP_PATH_ENV: &str = "OPDEN_OP_PATH";

/// Environment variable the `op` CLI reads to select the active account.
pub const OP_ACCOUNT_ENV: &str = "OP_ACCOUNT";

/// Poll interval while waiting on a limited invocation.
const WAIT_POLL: Duration = Duration::from_millis(10);

/// A fully built external command: argument vector plus environment overlay.
///
/// The overlay is applied to the spawned child only. The ambient environment
/// of the calling process is never mutated, so concurrent invocations with
/// different overlays stay independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl Invocation {
    /// Create an invocation from an argument vector.
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            env: Vec::new(),
        }
    }

    /// Add an environment variable to the overlay.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Argument vector passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Environment overlay applied to the child process.
    pub fn env_overlay(&self) -> &[(String, String)] {
        &self.env
    }
}

/// Opt-in execution limits for an invocation.
///
/// Both bounds default to `None`, meaning unlimited; no particular value is
/// assumed correct, callers decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Kill the child if it has not exited after this long.
    pub timeout: Option<Duration>,
    /// Fail if either output stream grows past this many bytes.
    pub max_output_bytes: Option<u64>,
}

impl Limits {
    fn is_unlimited(&self) -> bool {
        self.timeout.is_none() && self.max_output_bytes.is_none()
    }
}

/// Runs a built invocation and returns the captured stdout text.
///
/// The seam between the dispatcher and the real `op` binary. Production code
/// uses [`OpCli`]; tests substitute a recording fake so dispatch logic can
/// be exercised without spawning anything.
pub trait Invoke {
    /// Run the invocation to completion and return its stdout as text.
    ///
    /// # Errors
    ///
    /// Returns a `ToolError`-backed error if the process cannot be started,
    /// exits non-zero, exceeds a configured limit, or emits non-UTF-8 output.
    fn invoke(&self, invocation: &Invocation) -> Result<String>;
}

/// Invoker that spawns the real `op` binary.
#[derive(Debug, Clone)]
pub struct OpCli {
    program: PathBuf,
    limits: Limits,
}

impl OpCli {
    /// Create an invoker, resolving the `op` binary path.
    ///
    /// Checks the `OPDEN_OP_PATH` environment variable first, then searches
    /// `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if no `op` binary can be located.
    pub fn new() -> Result<Self> {
        Ok(Self {
            program: find_op_binary()?,
            limits: Limits::default(),
        })
    }

    /// Create an invoker for an explicit program path, skipping lookup.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            limits: Limits::default(),
        }
    }

    /// Apply execution limits to every invocation this invoker runs.
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Resolved path of the program this invoker spawns.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Invoke for OpCli {
    fn invoke(&self, invocation: &Invocation) -> Result<String> {
        trace!(args = ?invocation.args(), "invoking op");

        let mut cmd = Command::new(&self.program);
        cmd.args(invocation.args())
            .envs(
                invocation
                    .env_overlay()
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(ToolError::Spawn)?;

        let (status, stdout, stderr) = if self.limits.is_unlimited() {
            let output = child.wait_with_output().map_err(ToolError::Capture)?;
            (output.status, output.stdout, output.stderr)
        } else {
            capture_limited(child, self.limits)?
        };

        if !status.success() {
            let diagnostic = first_diagnostic_line(&stderr);
            debug!(%status, diagnostic = %diagnostic, "op exited with failure");
            return Err(ToolError::CommandFailed(diagnostic).into());
        }

        trace!(stdout_len = stdout.len(), "op succeeded");
        String::from_utf8(stdout).map_err(|_| ToolError::NonUtf8Output.into())
    }
}

/// Find the `op` binary: explicit env override first, then `PATH`.
fn find_op_binary() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(OP_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }
    which::which("op").map_err(|_| ToolError::NotFound.into())
}

/// First non-empty stderr line, or a placeholder.
///
/// `op` prefixes its errors with a timestamped `[ERROR]` line; the first
/// line carries the message, the rest is noise not worth surfacing.
fn first_diagnostic_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("unknown error")
        .to_string()
}

/// Wait for a child under limits, capturing both streams on reader threads.
///
/// The readers flag an overflow instead of erroring so the main thread can
/// kill the child; an unread pipe would otherwise leave it blocked forever.
fn capture_limited(
    mut child: Child,
    limits: Limits,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let overflowed = Arc::new(AtomicBool::new(false));

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = spawn_reader(stdout, limits.max_output_bytes, Arc::clone(&overflowed));
    let stderr_reader = spawn_reader(stderr, limits.max_output_bytes, Arc::clone(&overflowed));

    let deadline = limits.timeout.map(|timeout| Instant::now() + timeout);

    let status = loop {
        if overflowed.load(Ordering::SeqCst) {
            kill_and_reap(&mut child);
            // The limit is always set when the flag fires.
            let limit = limits.max_output_bytes.unwrap_or_default();
            return Err(ToolError::OutputTooLarge(limit).into());
        }
        if let Some(status) = child.try_wait().map_err(ToolError::Capture)? {
            break status;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                kill_and_reap(&mut child);
                // Timeout is set whenever a deadline exists.
                let timeout = limits.timeout.unwrap_or_default();
                return Err(ToolError::TimedOut(timeout).into());
            }
        }
        thread::sleep(WAIT_POLL);
    };

    let stdout = join_reader(stdout_reader)?;
    let stderr = join_reader(stderr_reader)?;

    // The child may have exited right as a reader crossed the cap.
    if overflowed.load(Ordering::SeqCst) {
        let limit = limits.max_output_bytes.unwrap_or_default();
        return Err(ToolError::OutputTooLarge(limit).into());
    }

    Ok((status, stdout, stderr))
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Drain a pipe on a thread, flagging `overflowed` once past the cap.
fn spawn_reader(
    pipe: Option<impl Read + Send + 'static>,
    cap: Option<u64>,
    overflowed: Arc<AtomicBool>,
) -> thread::JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let Some(mut pipe) = pipe else {
            return Ok(buf);
        };
        let mut chunk = [0u8; 8192];
        loop {
            let n = pipe.read(&mut chunk)?;
            if n == 0 {
                return Ok(buf);
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(cap) = cap {
                if buf.len() as u64 > cap {
                    overflowed.store(true, Ordering::SeqCst);
                    return Ok(buf);
                }
            }
        }
    })
}

fn join_reader(handle: thread::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    let bytes = handle
        .join()
        .map_err(|_| {
            ToolError::Capture(std::io::Error::new(
                std::io::ErrorKind::Other,
                "output reader thread panicked",
            ))
        })?
        .map_err(ToolError::Capture)?;
    Ok(bytes)
}
