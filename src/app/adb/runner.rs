use std::io::Read;
use std::process::{ChildStderr, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::app::error::AppError;

/// Mutations and enumeration get the generous timeout; settings reads poll
/// every few seconds and must fail fast.
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best error text available: stderr when the tool wrote one, stdout
    /// otherwise (adb reports some failures on stdout with exit code 0).
    pub fn detail(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::<u8>::new();
        let mut temp = [0u8; 4096];
        loop {
            match reader.read(&mut temp) {
                Ok(0) => break,
                Ok(count) => buffer.extend_from_slice(&temp[..count]),
                Err(_) => break,
            }
        }
        buffer
    })
}

/// Run the bridge executable with an explicit timeout.
///
/// stdout/stderr are piped and drained on their own threads; otherwise a
/// chatty child can block once the pipe buffer fills and an otherwise-fast
/// command would incorrectly hit the timeout.
///
/// Failure taxonomy: a spawn failure means the bridge executable itself is
/// unusable (`ERR_BRIDGE_UNAVAILABLE`); an overrun is `ERR_BRIDGE_TIMEOUT` so
/// a hung adb server stays distinguishable from a disconnected device.
pub fn run_bridge(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AppError::bridge_unavailable(
                    format!("{program} not found on PATH; install Android platform-tools"),
                    trace_id,
                )
            } else {
                AppError::bridge_unavailable(format!("failed to spawn {program}: {err}"), trace_id)
            }
        })?;

    let stdout: ChildStdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::system("failed to capture stdout", trace_id))?;
    let stderr: ChildStderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::system("failed to capture stderr", trace_id))?;
    let stdout_handle = drain(stdout);
    let stderr_handle = drain(stderr);

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_handle.join();
                    let _ = stderr_handle.join();
                    return Err(AppError::bridge_timeout(
                        format!(
                            "{program} {} timed out after {}s",
                            args.join(" "),
                            timeout.as_secs()
                        ),
                        trace_id,
                    ));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(AppError::system(
                    format!("failed to poll {program}: {err}"),
                    trace_id,
                ));
            }
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code,
    })
}

/// Argument list for a command scoped to one device.
pub fn serial_args(serial: &str, tail: &[&str]) -> Vec<String> {
    let mut args = Vec::with_capacity(tail.len() + 2);
    args.push("-s".to_string());
    args.push(serial.to_string());
    args.extend(tail.iter().map(|part| (*part).to_string()));
    args
}
