//! Command execution tool: run_command
//!
//! Runs a shell command with piped output. Each stdout/stderr line is
//! forwarded to the output sink as it arrives; the combined output is
//! returned to the model once the process exits. Timeout and cancellation
//! kill the whole process group.

use super::builtin::BuiltinTool;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use warden_application::{ExecutionParams, OutputSink};
use warden_domain::{
    ToolCall, ToolError, ToolErrorKind, ToolKind, ToolParameter, ToolResult, ToolResultMetadata,
    ToolSchema, truncate, truncate_output,
};

/// Tool name constant
pub const RUN_COMMAND: &str = "run_command";

/// Per-stream capture limit; lines past it are still streamed, not kept.
const MAX_CAPTURE_SIZE: usize = 10 * 1024 * 1024;

pub struct RunCommandTool {
    params: Arc<ExecutionParams>,
    schema: ToolSchema,
}

impl RunCommandTool {
    pub fn new(params: Arc<ExecutionParams>) -> Self {
        let schema = ToolSchema::new(
            RUN_COMMAND,
            "Execute a shell command and return its output. A non-zero exit code is reported in the output, not as an error.",
        )
        .with_parameter(ToolParameter::new("command", "The command to execute", true))
        .with_parameter(
            ToolParameter::new("working_dir", "Working directory for the command", false)
                .with_type("path"),
        )
        .with_parameter(
            ToolParameter::new("timeout_secs", "Timeout in seconds", false).with_type("integer"),
        );
        Self { params, schema }
    }
}

enum Outcome {
    Finished(std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)>),
    TimedOut,
    Cancelled,
}

fn shell_command(command: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    }
}

/// Longest chunk handed to the sink; longer lines are split.
const MAX_LINE_LENGTH: usize = 64 * 1024;

fn emit_line(line: &mut Vec<u8>, collected: &mut Vec<u8>, on_output: Option<&OutputSink>) {
    if let Some(sink) = on_output {
        sink(&String::from_utf8_lossy(line));
    }
    let room = MAX_CAPTURE_SIZE.saturating_sub(collected.len());
    collected.extend_from_slice(&line[..line.len().min(room)]);
    line.clear();
}

/// Read `stream` line by line, forwarding each line to `on_output`.
///
/// Memory stays bounded even for output without newlines: lines longer
/// than [`MAX_LINE_LENGTH`] are forwarded in pieces.
async fn pump<R: AsyncRead + Unpin>(stream: Option<R>, on_output: Option<&OutputSink>) -> Vec<u8> {
    let Some(stream) = stream else {
        return Vec::new();
    };
    let mut reader = BufReader::new(stream);
    let mut collected = Vec::new();
    let mut line = Vec::with_capacity(1024);

    loop {
        let buf = match reader.fill_buf().await {
            Ok([]) | Err(_) => break,
            Ok(buf) => buf,
        };
        let room = MAX_LINE_LENGTH - line.len();
        let (take, complete) = match buf.iter().take(room).position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => {
                let n = buf.len().min(room);
                (n, line.len() + n == MAX_LINE_LENGTH)
            }
        };
        line.extend_from_slice(&buf[..take]);
        reader.consume(take);

        if complete {
            emit_line(&mut line, &mut collected, on_output);
        }
    }
    if !line.is_empty() {
        emit_line(&mut line, &mut collected, on_output);
    }
    collected
}

async fn collect_output(
    child: &mut Child,
    on_output: Option<&OutputSink>,
) -> std::io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (out, err) = tokio::join!(pump(stdout, on_output), pump(stderr, on_output));
    let status = child.wait().await?;
    Ok((status, out, err))
}

/// Kill the child and everything it spawned, then reap it.
async fn kill_tree(child: &mut Child) {
    #[cfg(target_os = "linux")]
    if let Some(pid) = child.id() {
        // The child leads its own process group (see `process_group(0)`).
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    if let Err(e) = child.kill().await {
        debug!("Failed to kill command: {}", e);
    }
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let mut combined = String::new();
    combined.push_str(&stdout);
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(&stderr);
    }
    combined
}

#[async_trait]
impl BuiltinTool for RunCommandTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Execute
    }

    fn describe(&self, call: &ToolCall) -> String {
        let command = call.get_string("command").unwrap_or_default();
        match call.get_string("working_dir") {
            Some(dir) => format!("Run `{}` in {}", truncate(command, 200), dir),
            None => format!("Run `{}`", truncate(command, 200)),
        }
    }

    async fn run(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        on_output: Option<&OutputSink>,
    ) -> Result<ToolResult, ToolError> {
        let command_str = call.require_string("command").map_err(ToolError::invalid_argument)?;
        let timeout = call
            .get_u64("timeout_secs")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(self.params.command_timeout);

        let working_dir = match call.get_string("working_dir") {
            Some(dir) => Some(self.params.resolve_path(dir)),
            None => self.params.working_dir.clone(),
        };

        let mut cmd = shell_command(command_str);

        if let Some(dir) = &working_dir {
            if !dir.exists() {
                return Err(ToolError::new(
                    ToolErrorKind::FileNotFound,
                    format!("Working directory does not exist: {}", dir.display()),
                ));
            }
            if !dir.is_dir() {
                return Err(ToolError::invalid_argument(format!(
                    "'{}' is not a directory",
                    dir.display()
                )));
            }
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: own process group so the whole tree can be killed, and
        // SIGTERM from the kernel if warden itself dies.
        #[cfg(target_os = "linux")]
        {
            cmd.process_group(0);
            unsafe {
                cmd.pre_exec(|| {
                    libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                    Ok(())
                });
            }
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ToolError::shell(format!("Failed to spawn command: {}", e)))?;
        debug!(command = %truncate(command_str, 120), pid = ?child.id(), "Spawned command");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Outcome::Cancelled,
            _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
            output = collect_output(&mut child, on_output) => Outcome::Finished(output),
        };

        let (status, stdout, stderr) = match outcome {
            Outcome::Finished(output) => output
                .map_err(|e| ToolError::shell(format!("Failed to wait for command: {}", e)))?,
            Outcome::TimedOut => {
                kill_tree(&mut child).await;
                warn!(command = %truncate(command_str, 120), "Command timed out");
                return Err(ToolError::timeout(format!(
                    "command exceeded {} seconds: {}",
                    timeout.as_secs(),
                    truncate(command_str, 200)
                )));
            }
            Outcome::Cancelled => {
                kill_tree(&mut child).await;
                return Err(ToolError::cancelled(format!(
                    "Command cancelled: {}",
                    truncate(command_str, 200)
                )));
            }
        };

        let exit_code = status.code().unwrap_or(-1);
        let combined = combine_output(&stdout, &stderr);
        let (output, _) = truncate_output(&combined, self.params.max_output_bytes);

        let metadata = ToolResultMetadata {
            bytes: Some(combined.len()),
            exit_code: Some(exit_code),
            ..Default::default()
        };

        // A non-zero exit is still a completed call; the model decides what
        // to do with it.
        let content = if status.success() {
            output
        } else {
            format!("Command exited with code {}\n{}", exit_code, output)
        };

        Ok(ToolResult::success(RUN_COMMAND, content).with_metadata(metadata))
    }
}
