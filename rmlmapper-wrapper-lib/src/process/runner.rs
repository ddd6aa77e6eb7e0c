use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::command::CommandSpec;
use crate::ExecutionError;

/// How long the output readers may keep running once the engine itself has
/// exited. A grandchild that inherited the pipes keeps them open after the
/// engine is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Captured result of a finished engine process. A non-zero exit code is
/// data here; classification happens in [`super::classify`].
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// stdout and stderr interleaved in arrival order.
    pub log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Spawn the command and wait for it to exit.
    ///
    /// The child is killed if the timeout elapses or if the returned future
    /// is dropped before completion.
    pub async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutcome, ExecutionError> {
        tracing::debug!("Running engine: {}", spec);

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::ProcessSpawn {
                program: spec.program.display().to_string(),
                source: e,
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(out, Stream::Stdout, tx.clone())));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(err, Stream::Stderr, tx)));

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    tracing::warn!("Engine exceeded timeout of {:?}, killing it", limit);
                    // kill() waits for the child after signalling it
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill engine process: {}", e);
                    }
                    let partial = drain(stdout_task, stderr_task, rx, DRAIN_GRACE).await;
                    return Err(ExecutionError::Process {
                        reason: format!("timed out after {:?}", limit),
                        log: partial.log,
                    });
                }
            },
            None => child.wait().await,
        };

        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                if let Err(kill_err) = child.kill().await {
                    tracing::warn!("Failed to kill engine process: {}", kill_err);
                }
                let partial = drain(stdout_task, stderr_task, rx, DRAIN_GRACE).await;
                return Err(ExecutionError::Process {
                    reason: format!("failed to wait for engine: {}", e),
                    log: partial.log,
                });
            }
        };

        let mut outcome = drain(stdout_task, stderr_task, rx, DRAIN_GRACE).await;
        outcome.exit_code = status.code();
        tracing::debug!("Engine exited with {:?}", outcome.exit_code);
        Ok(outcome)
    }
}

async fn forward_lines<R>(
    reader: R,
    stream: Stream,
    tx: mpsc::UnboundedSender<(Stream, String)>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        if tx
            .send((stream, String::from_utf8_lossy(&buf).into_owned()))
            .is_err()
        {
            return Ok(());
        }
    }
}

/// Assemble the captured streams once the engine has exited.
///
/// Readers still open after `grace` are aborted and whatever arrived until
/// then is returned.
async fn drain(
    stdout_task: Option<JoinHandle<std::io::Result<()>>>,
    stderr_task: Option<JoinHandle<std::io::Result<()>>>,
    mut rx: mpsc::UnboundedReceiver<(Stream, String)>,
    grace: Duration,
) -> ProcessOutcome {
    let mut outcome = ProcessOutcome::default();
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some((stream, chunk))) => {
                outcome.log.push_str(&chunk);
                match stream {
                    Stream::Stdout => outcome.stdout.push_str(&chunk),
                    Stream::Stderr => outcome.stderr.push_str(&chunk),
                }
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    "Engine output still open {:?} after exit, abandoning readers",
                    grace
                );
                for task in [stdout_task, stderr_task].into_iter().flatten() {
                    task.abort();
                }
                return outcome;
            }
        }
    }

    for task in [stdout_task, stderr_task].into_iter().flatten() {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to read engine output: {}", e),
            Err(e) => tracing::warn!("Engine output reader failed: {}", e),
        }
    }
    outcome
}
