/// Bounded collection of script output.
///
/// Both output pipes are drained on their own tasks while the parent waits for the
/// child, so a full pipe can never stall the script. Once the child has exited each
/// stream gets a fixed deadline to deliver its remaining lines; whatever arrived by
/// then is kept and the drain is abandoned.
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::runner::ProcessHandle;

/// Everything one script run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    /// Error text found while collecting; empty when nothing looked wrong.
    pub status_message: String,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.status_message.trim().is_empty()
    }
}

/// Drain the handle's streams, wait for the child and gather the result.
pub async fn collect(mut handle: ProcessHandle, timeout: Duration) -> Result<ExecutionResult> {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (err_tx, err_rx) = mpsc::unbounded_channel();

    let mut drains: Vec<JoinHandle<()>> = Vec::with_capacity(2);
    if let Some(stdout) = handle.take_stdout() {
        drains.push(tokio::spawn(drain(stdout, out_tx.clone())));
    }
    if let Some(stderr) = handle.take_stderr() {
        let tx = if handle.merge_stderr() {
            out_tx.clone()
        } else {
            err_tx.clone()
        };
        drains.push(tokio::spawn(drain(stderr, tx)));
    }
    // channels close once every drain has dropped its sender
    drop(out_tx);
    drop(err_tx);

    let status = match handle.wait().await {
        Ok(status) => status,
        Err(e) => {
            log::error!("Error waiting for '{}' to terminate: {}", handle.program(), e);
            abort_all(&drains);
            return Err(e);
        }
    };

    let (stdout, stderr) = tokio::join!(
        receive(out_rx, timeout, "stdout"),
        receive(err_rx, timeout, "stderr")
    );
    abort_all(&drains);

    let mut status_message = String::new();
    if !stderr.is_empty() {
        log::error!("Found error in script: {:?}", stderr);
        push_line(&mut status_message, &stderr.join("\n"));
    }

    if let Some(marker) = handle.error_marker() {
        for line in stdout.iter().filter(|line| line.contains(marker)) {
            log::error!("Found error in script: {}", line);
            push_line(&mut status_message, line);
        }
    }

    let exit_code = match status.code() {
        Some(code) => code,
        None => {
            push_line(&mut status_message, &format!("process {}", status));
            1
        }
    };

    Ok(ExecutionResult {
        exit_code,
        stdout,
        stderr,
        status_message,
    })
}

fn push_line(message: &mut String, line: &str) {
    if !message.is_empty() {
        message.push('\n');
    }
    message.push_str(line);
}

fn abort_all(drains: &[JoinHandle<()>]) {
    for drain in drains {
        drain.abort();
    }
}

/// Forward each line of `reader` until end of stream.
async fn drain<R: AsyncRead + Unpin>(reader: R, tx: mpsc::UnboundedSender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!("Error reading script output: {}", e);
                break;
            }
        }
    }
}

/// Take lines until the stream closes or `timeout` passes, then keep what is buffered.
async fn receive(
    mut rx: mpsc::UnboundedReceiver<String>,
    timeout: Duration,
    stream: &str,
) -> Vec<String> {
    let mut lines = Vec::new();

    let finished = tokio::time::timeout(timeout, async {
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
    })
    .await;

    if finished.is_err() {
        log::warn!(
            "Script {} still open after {}s, continuing with {} line(s)",
            stream,
            timeout.as_secs_f32(),
            lines.len()
        );
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
    }

    lines
}
