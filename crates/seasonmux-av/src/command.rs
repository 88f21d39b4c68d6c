//! Builder for executing external tool commands with optional deadlines.

use crate::{Error, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a child with a deadline is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output captured from a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// Execution is synchronous: the calling thread blocks until the process
/// exits, or until the deadline passes when one is set. Output streams are
/// fully buffered, never streamed.
///
/// # Example
///
/// ```no_run
/// use seasonmux_av::ToolCommand;
/// use std::path::PathBuf;
///
/// let mut cmd = ToolCommand::new(PathBuf::from("mkvmerge"));
/// cmd.arg("--quiet").arg("-o").arg("/out/Show - S01E01.mkv");
/// cmd.arg("/in/show.S01E01.mkv");
/// let output = cmd.execute()?;
/// println!("exit code: {:?}", output.exit_code);
/// # Ok::<(), seasonmux_av::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time. Without one the call waits forever.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    /// Argument vector, excluding the program.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short name of the program, used in error messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Render the command line for display, quoting arguments with spaces.
    pub fn display(&self) -> String {
        let mut line = quote(&self.program.to_string_lossy());
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        line
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// A non-zero exit status is not an error here; inspect
    /// [`ToolOutput::exit_code`].
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program does not exist.
    /// - [`Error::Spawn`] if the process cannot be started for another reason.
    /// - [`Error::Timeout`] if a deadline was set and expired; the child is
    ///   killed before returning.
    /// - [`Error::Io`] if waiting on the child fails.
    pub fn execute(&self) -> Result<ToolOutput> {
        let program_name = self.program_name();

        #[cfg(feature = "tracing")]
        tracing::debug!(command = %self.display(), "Running external tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(program_name.clone())
            } else {
                Error::spawn(program_name.clone(), e.to_string())
            }
        })?;

        match self.timeout {
            None => Ok(child.wait_with_output()?.into()),
            Some(limit) => wait_with_deadline(child, limit, &program_name),
        }
    }
}

/// Wait for `child` until `limit` elapses, draining both pipes on helper
/// threads so a chatty child cannot block on a full pipe.
fn wait_with_deadline(mut child: Child, limit: Duration, tool: &str) -> Result<ToolOutput> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + limit;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                reap(&mut child);
                return Err(e.into());
            }
        }
        if Instant::now() >= deadline {
            reap(&mut child);

            #[cfg(feature = "tracing")]
            tracing::warn!("{} exceeded its {:?} deadline and was killed", tool, limit);

            return Err(Error::timeout(tool, limit));
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(ToolOutput {
        exit_code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

/// Kill and wait for `child`. The drain threads finish once the pipes close.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).to_string()
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

/// Runs a prepared [`ToolCommand`].
///
/// The process-backed implementation is [`ProcessInvoker`]; alternative
/// implementations can print, record, or script results instead of spawning.
pub trait ToolInvoker: Send + Sync {
    /// Run the command to completion.
    fn invoke(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Invokes commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ToolInvoker for ProcessInvoker {
    fn invoke(&self, command: &ToolCommand) -> Result<ToolOutput> {
        command.execute()
    }
}
