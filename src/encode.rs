use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Probed once at startup; a missing encoder is fatal before any render runs.
pub fn ensure_ffmpeg() -> RenderResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(RenderError::encode(
            "ffmpeg is not installed or not found in PATH; replaycast requires ffmpeg to function",
        ));
    }
    Ok(())
}

/// Sibling path the remuxed stream lands in before replacing the original.
fn final_sibling(raw: &Path) -> PathBuf {
    let stem = raw.file_stem().and_then(|s| s.to_str()).unwrap_or("capture");
    let ext = raw.extension().and_then(|s| s.to_str()).unwrap_or("webm");
    raw.with_file_name(format!("{stem}-final.{ext}"))
}

fn remux_args(raw: &Path, out: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        raw.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        out.display().to_string(),
    ]
}

/// Stream-copies the raw capture into a fresh container and atomically
/// replaces it, restoring the duration/index metadata the mid-stream closure
/// lost. On encoder failure the raw file is left in place and the target
/// fails; it is never returned as a usable artifact.
pub async fn finalize(raw: &Path) -> RenderResult<PathBuf> {
    let tmp = final_sibling(raw);

    let output = tokio::process::Command::new("ffmpeg")
        .args(remux_args(raw, &tmp))
        .output()
        .await
        .map_err(|e| RenderError::encode(format!("failed to spawn ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RenderError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    tokio::fs::remove_file(raw)
        .await
        .with_context(|| format!("failed to remove raw capture '{}'", raw.display()))?;
    tokio::fs::rename(&tmp, raw)
        .await
        .with_context(|| format!("failed to move finalized capture into '{}'", raw.display()))?;

    debug!(out = %raw.display(), "capture finalized");
    Ok(raw.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_sibling_keeps_extension() {
        let raw = Path::new("/tmp/replaycast/1712-0001.webm");
        assert_eq!(
            final_sibling(raw),
            Path::new("/tmp/replaycast/1712-0001-final.webm")
        );
    }

    #[test]
    fn remux_is_a_stream_copy() {
        let args = remux_args(Path::new("a.webm"), Path::new("a-final.webm"));
        let copy_at = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[copy_at + 1], "copy");
        assert!(!args.iter().any(|a| a.starts_with("-c:v")));
    }
}
