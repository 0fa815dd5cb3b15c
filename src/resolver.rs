use crate::config::AppConfig;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Locations of the external tools, probed once at startup. The pipeline
/// depends on this instead of re-probing paths per invocation; a tool that
/// is `None` here simply routes every message to the fallback synthesizer.
#[derive(Debug, Clone, Default)]
pub struct ExecutableResolver {
    pub ffmpeg: Option<PathBuf>,
    pub rhubarb: Option<PathBuf>,
}

impl ExecutableResolver {
    /// Resolve both tools from config overrides or the usual install
    /// locations.
    pub async fn resolve(cfg: &AppConfig) -> Self {
        let ffmpeg = resolve_tool("ffmpeg", cfg.ffmpeg_path.as_deref(), "-version").await;
        let rhubarb = resolve_tool("rhubarb", cfg.rhubarb_path.as_deref(), "--version").await;
        if ffmpeg.is_none() {
            warn!("ffmpeg not found; audio will be aligned untranscoded");
        }
        if rhubarb.is_none() {
            warn!("rhubarb not found; all lip sync will use the text fallback");
        }
        Self { ffmpeg, rhubarb }
    }

    /// Fail fast for deployments that must have the aligner.
    pub fn require_rhubarb(&self) -> Result<&Path> {
        self.rhubarb
            .as_deref()
            .ok_or_else(|| PipelineError::ConfigurationMissing("rhubarb executable".to_string()))
    }
}

async fn resolve_tool(
    name: &str,
    override_path: Option<&Path>,
    version_flag: &str,
) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = override_path {
        candidates.push(p.to_path_buf());
    }
    candidates.push(PathBuf::from(name));
    candidates.push(PathBuf::from(format!("/usr/bin/{name}")));
    candidates.push(PathBuf::from(format!("/usr/local/bin/{name}")));

    for candidate in candidates {
        if probe(&candidate, version_flag).await {
            debug!(tool = name, path = %candidate.display(), "resolved executable");
            return Some(candidate);
        }
    }
    None
}

/// A candidate counts as executable if it can be spawned at all.
async fn probe(path: &Path, version_flag: &str) -> bool {
    Command::new(path)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .is_ok()
}
