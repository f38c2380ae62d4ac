//! External formatter pass over the generated stub.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::{FormatterConfig, FILENAME_PLACEHOLDER};
use crate::error::{Result, StubError};

fn failed(reason: impl Into<String>) -> StubError {
    StubError::FormattingFailed { reason: reason.into() }
}

/// Pipe `code` through the configured formatter and return its stdout.
///
/// `filename` replaces `{filename}` in the arguments; the formatter never opens it. A spawn
/// failure or a non-zero exit is an error, the unformatted text is never returned instead.
pub fn format_stub(code: &str, filename: &str, config: &FormatterConfig) -> Result<String> {
    let args: Vec<String> =
        config.command.iter().map(|a| a.replace(FILENAME_PLACEHOLDER, filename)).collect();
    let Some((program, rest)) = args.split_first() else {
        return Err(failed("formatter command is empty"));
    };
    debug!(program = program.as_str(), args = ?rest, "Running formatter");

    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| failed(format!("could not run {program}: {e}")))?;

    let mut stdin = child.stdin.take().ok_or_else(|| failed("formatter stdin unavailable"))?;
    let input = code.to_owned();
    // Separate writer: the formatter may fill its stdout pipe before it has read all input.
    let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child
        .wait_with_output()
        .map_err(|e| failed(format!("could not wait for {program}: {e}")))?;
    let written = writer.join().map_err(|_| failed("formatter input thread panicked"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failed(format!("{program} exited with {}: {}", output.status, stderr.trim())));
    }
    written.map_err(|e| failed(format!("could not write to {program}: {e}")))?;

    String::from_utf8(output.stdout).map_err(|e| failed(format!("{program} output is not UTF-8: {e}")))
}
