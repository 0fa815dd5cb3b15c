use crate::error::{PipelineError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Convert `input` into the PCM wav container the aligner wants.
///
/// Failure here is never fatal to a message: the orchestrator decides
/// whether to try the aligner on the raw audio or go straight to the
/// fallback synthesizer.
pub async fn transcode(ffmpeg: &Path, input: &Path, output: &Path) -> Result<()> {
    debug!(input = %input.display(), output = %output.display(), "transcoding");
    let result = Command::new(ffmpeg)
        .arg("-y")
        .arg("-i")
        .arg(input)
        .arg(output)
        .output()
        .await
        .map_err(|e| PipelineError::TranscodeFailed(format!("failed to start ffmpeg: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(PipelineError::TranscodeFailed(format!(
            "ffmpeg exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    info!(output = %output.display(), "transcode done");
    Ok(())
}
