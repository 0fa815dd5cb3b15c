use crate::error::{PipelineError, Result};
use crate::message::LipSync;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Run the forced aligner over a waveform and parse the cue file it writes.
///
/// Executable missing, non-zero exit and malformed output all surface as
/// `AlignmentFailed`; the caller's recovery (fallback synthesis) is the same
/// for every cause, so the causes only differ in what gets logged.
pub async fn align(rhubarb: &Path, wav: &Path, out_json: &Path) -> Result<LipSync> {
    debug!(wav = %wav.display(), "running forced alignment");
    let result = Command::new(rhubarb)
        .arg("-f")
        .arg("json")
        .arg("-o")
        .arg(out_json)
        .arg(wav)
        .arg("-r")
        .arg("phonetic")
        .output()
        .await
        .map_err(|e| PipelineError::AlignmentFailed(format!("failed to start rhubarb: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(PipelineError::AlignmentFailed(format!(
            "rhubarb exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    let lipsync = read_cue_file(out_json).await?;
    info!(cues = lipsync.mouth_cues.len(), "alignment done");
    Ok(lipsync)
}

/// Parse a `{"mouthCues": [...]}` file and reject anything malformed, so a
/// partial structure never escapes to a consumer.
pub async fn read_cue_file(path: &Path) -> Result<LipSync> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::AlignmentFailed(format!("cue file unreadable: {e}")))?;
    let lipsync: LipSync = serde_json::from_str(&content)
        .map_err(|e| PipelineError::AlignmentFailed(format!("cue file malformed: {e}")))?;
    if !lipsync.is_well_formed() {
        return Err(PipelineError::AlignmentFailed(
            "cue file violates ordering invariants".to_string(),
        ));
    }
    Ok(lipsync)
}
