//! Running external media programs (yt-dlp, ffmpeg, ffprobe).

use crate::error::{MediabotError, Result};
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Run `program` with `args` and collect its output.
///
/// The child is killed if the returned future is dropped, so an abandoned
/// call never leaves a transcoder running. A missing binary maps to
/// `ToolNotFound`; a non-zero exit maps to `ExternalOperation` carrying the
/// last line of stderr.
pub async fn run<I, S>(program: &str, args: I, operation: &str) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {:?}", command.as_std());

    let output = match command.output().await {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediabotError::ToolNotFound(program.to_string()));
        }
        Err(e) => {
            return Err(MediabotError::external(
                operation,
                format!("{program} execution failed: {e}"),
            ));
        }
    };

    if !output.status.success() {
        return Err(MediabotError::external(operation, stderr_summary(&output)));
    }

    Ok(output)
}

/// The most useful part of a failed program's stderr.
pub fn stderr_summary(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("exited with {}", output.status))
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &std::path::Path) -> Result<f64> {
    let output = run(
        "ffprobe",
        [
            OsStr::new("-v"),
            OsStr::new("quiet"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_format"),
            path.as_os_str(),
        ],
        "Probe",
    )
    .await?;

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| MediabotError::external("Probe", "Invalid ffprobe output"))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| MediabotError::external("Probe", "Could not determine media duration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_tool_not_found() {
        let err = run("definitely-not-a-real-binary-4242", ["--version"], "Probe")
            .await
            .unwrap_err();
        assert!(matches!(err, MediabotError::ToolNotFound(name) if name == "definitely-not-a-real-binary-4242"));
    }
}
