use std::process::Stdio;

use tokio::{io::AsyncWriteExt, process::Command};

use crate::error::{ReelsubError, Result};

#[cfg(target_os = "macos")]
const TOOLS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const TOOLS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const TOOLS: &[(&str, &[&str])] = &[("wl-copy", &[]), ("xclip", &["-selection", "clipboard"])];

async fn pipe_to(tool: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ReelsubError::ClipboardFailed {
            reason: format!("{tool}: {e}"),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| ReelsubError::ClipboardFailed {
                reason: format!("{tool}: {e}"),
            })?;
    }

    let status = child
        .wait()
        .await
        .map_err(|e| ReelsubError::ClipboardFailed {
            reason: format!("{tool}: {e}"),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ReelsubError::ClipboardFailed {
            reason: format!("{tool} exited with {status}"),
        })
    }
}

/// Copy text to the system clipboard by piping it to the platform tool.
/// Best-effort: callers are free to log the error and move on.
pub async fn copy_text(text: &str) -> Result<()> {
    let mut last_reason = String::from("no clipboard tool available");
    for (tool, args) in TOOLS {
        match pipe_to(tool, args, text).await {
            Ok(()) => {
                log::debug!("copied {} bytes via {tool}", text.len());
                return Ok(());
            }
            Err(e) => last_reason = e.to_string(),
        }
    }
    Err(ReelsubError::ClipboardFailed {
        reason: last_reason,
    })
}
