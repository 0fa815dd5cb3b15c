use thiserror::Error;

/// Pipeline and collaborator errors.
///
/// The three stage errors (`SynthesisUnavailable`, `TranscodeFailed`,
/// `AlignmentFailed`) are all recovered inside the orchestrator and never
/// reach an HTTP caller. `UpstreamDialogueFailed` is fatal for the whole
/// request; `ConfigurationMissing` is fatal only for voice-bearing responses.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("speech renderer unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("audio transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("forced alignment failed: {0}")]
    AlignmentFailed(String),

    #[error("dialogue source failed: {0}")]
    UpstreamDialogueFailed(String),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
