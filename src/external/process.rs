//! Runs one external command to completion and captures its output.

use tokio::process::Command;

use crate::error::ProcessError;

/// Runs `cmd`, returning stdout followed by stderr.
///
/// `label` names the command in errors and logs (e.g. `"git commit"`).
pub(crate) async fn run(label: &str, cmd: &mut Command) -> Result<String, ProcessError> {
    tracing::debug!(command = label, args = ?cmd.as_std().get_args().collect::<Vec<_>>(), "running");

    let output = cmd.output().await.map_err(|source| ProcessError::Spawn {
        program: label.to_string(),
        source,
    })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(combined)
    } else {
        Err(ProcessError::Failed {
            program: label.to_string(),
            status: output.status.code(),
            output: combined,
        })
    }
}
