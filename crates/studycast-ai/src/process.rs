//! Running local CLI backends (edge-tts, whisper).

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{AiError, AiResult};

/// Run `program` to completion within `timeout`.
///
/// The child is killed if the timeout fires or the future is dropped.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> AiResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let path = which::which(program).map_err(|_| AiError::ToolNotFound(program.to_string()))?;

    let mut cmd = Command::new(path);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!(program, "Running tool");

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => return Err(AiError::Timeout(timeout.as_secs())),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(10).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return Err(AiError::tool_failed(
            program,
            format!("exit status {:?}: {}", output.status.code(), tail.join("\n")),
        ));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool() {
        let result = run_tool(
            "studycast-definitely-not-installed",
            ["--version"],
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(AiError::ToolNotFound(_))));
    }
}
