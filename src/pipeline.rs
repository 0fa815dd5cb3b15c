//! Per-message viseme timing pipeline.
//!
//! Each message walks TRANSCODE → ALIGN; any stage failure drops to the
//! fallback synthesizer, which cannot fail, so every message reaches a
//! terminal state. A failure on one message never aborts the rest of a
//! batch.

use crate::config::{AppConfig, FallbackPolicy};
use crate::error::{PipelineError, Result};
use crate::fallback;
use crate::message::{LipSync, Message, MessageDraft};
use crate::resolver::ExecutableResolver;
use crate::tts::SpeechRenderer;
use crate::{align, transcode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Scratch paths for one message's pipeline run. Named by a per-run token
/// plus message index so concurrent requests sharing the scratch directory
/// never collide.
#[derive(Debug)]
pub struct AlignmentRequest {
    pub input: PathBuf,
    pub wav: PathBuf,
    pub cues: PathBuf,
}

impl AlignmentRequest {
    pub fn new(scratch_dir: &Path, token: &str, index: usize) -> Self {
        let stem = format!("message_{token}_{index}");
        Self {
            input: scratch_dir.join(format!("{stem}.mp3")),
            wav: scratch_dir.join(format!("{stem}.wav")),
            cues: scratch_dir.join(format!("{stem}.json")),
        }
    }

    /// Best-effort removal; leftovers are the OS scratch dir's problem.
    pub async fn cleanup(&self) {
        for path in [&self.input, &self.wav, &self.cues] {
            let _ = tokio::fs::remove_file(path).await;
        }
    }
}

/// The pipeline orchestrator. Holds the resolved executables and the
/// handful of config knobs it needs; built once and shared.
pub struct LipSyncPipeline {
    resolver: ExecutableResolver,
    scratch_dir: PathBuf,
    fallback_policy: FallbackPolicy,
    stage_timeout: Option<Duration>,
    transcode_required: bool,
}

impl LipSyncPipeline {
    pub fn new(cfg: &AppConfig, resolver: ExecutableResolver) -> Self {
        Self {
            resolver,
            scratch_dir: cfg.scratch_dir.clone(),
            fallback_policy: cfg.fallback_policy,
            stage_timeout: cfg.stage_timeout,
            transcode_required: cfg.transcode_required,
        }
    }

    /// The single outward operation of the core: cues for one utterance.
    ///
    /// With audio, tries the transcode+align path and falls back to text
    /// timing on any failure. Without audio there is nothing to align, so
    /// timing is estimated from text length alone. Returns `None` only
    /// under the null fallback policy.
    pub async fn produce_lipsync(&self, text: &str, audio: Option<&Path>) -> Option<LipSync> {
        match audio {
            Some(path) => {
                let request =
                    AlignmentRequest::new(&self.scratch_dir, &Uuid::new_v4().to_string(), 0);
                let result = self.aligned_lipsync(path, &request).await;
                request.cleanup().await;
                match result {
                    Ok(lipsync) => Some(lipsync),
                    Err(e) => self.fall_back(text, e),
                }
            }
            None => self.fall_back(
                text,
                PipelineError::SynthesisUnavailable("no audio".to_string()),
            ),
        }
    }

    /// Process a batch of drafts: render speech, attach audio and cues.
    /// Messages are independent; each gets its own scratch files and its
    /// own failure handling.
    pub async fn process_batch(
        &self,
        drafts: Vec<MessageDraft>,
        renderer: &dyn SpeechRenderer,
    ) -> Vec<Message> {
        let token = Uuid::new_v4().to_string();
        let mut messages = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.into_iter().enumerate() {
            messages.push(self.process_message(draft, renderer, &token, index).await);
        }
        messages
    }

    async fn process_message(
        &self,
        draft: MessageDraft,
        renderer: &dyn SpeechRenderer,
        token: &str,
        index: usize,
    ) -> Message {
        let started = Instant::now();
        let mut message = Message::from_draft(draft);
        let request = AlignmentRequest::new(&self.scratch_dir, token, index);

        match renderer.render(&message.text).await {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&request.input, &bytes).await {
                    warn!(index, error = %e, "could not persist rendered audio");
                    message.lipsync = self.fall_back(&message.text, e.into());
                } else {
                    message.audio = Some(BASE64.encode(&bytes));
                    message.lipsync = match self.aligned_lipsync(&request.input, &request).await {
                        Ok(lipsync) => Some(lipsync),
                        Err(e) => self.fall_back(&message.text, e),
                    };
                }
            }
            Err(e) => {
                // No audio at all; the message still ships, with timing
                // estimated from text so the avatar has something to drive.
                warn!(index, error = %e, "speech rendering failed");
                message.lipsync = self.fall_back(
                    &message.text,
                    PipelineError::SynthesisUnavailable(e.to_string()),
                );
            }
        }

        request.cleanup().await;
        info!(
            index,
            elapsed_ms = started.elapsed().as_millis() as u64,
            aligned = message.audio.is_some() && message.lipsync.is_some(),
            "message processed"
        );
        message
    }

    /// TRANSCODE → ALIGN. Transcode failure degrades: either the aligner
    /// gets the raw audio, or (strict mode) the stage error propagates and
    /// the caller falls back.
    async fn aligned_lipsync(&self, audio: &Path, request: &AlignmentRequest) -> Result<LipSync> {
        let rhubarb = self.resolver.require_rhubarb()?;

        let wav: &Path = match &self.resolver.ffmpeg {
            Some(ffmpeg) => {
                let stage = transcode::transcode(ffmpeg, audio, &request.wav);
                match self.bounded(stage, PipelineError::TranscodeFailed).await {
                    Ok(()) => &request.wav,
                    Err(e) if self.transcode_required => return Err(e),
                    Err(e) => {
                        debug!(error = %e, "transcode failed, aligning raw audio");
                        audio
                    }
                }
            }
            None if self.transcode_required => {
                return Err(PipelineError::ConfigurationMissing(
                    "ffmpeg executable".to_string(),
                ))
            }
            None => audio,
        };

        let stage = align::align(rhubarb, wav, &request.cues);
        self.bounded(stage, PipelineError::AlignmentFailed).await
    }

    /// Apply the configured fallback policy after a stage failure.
    fn fall_back(&self, text: &str, cause: PipelineError) -> Option<LipSync> {
        match self.fallback_policy {
            FallbackPolicy::Synthesize => {
                debug!(error = %cause, "using text fallback for cues");
                Some(fallback::synthesize(text, fallback::estimate_duration(text)))
            }
            FallbackPolicy::Null => {
                debug!(error = %cause, "fallback policy is null, attaching no cues");
                None
            }
        }
    }

    async fn bounded<T, F>(&self, stage: F, on_timeout: fn(String) -> PipelineError) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.stage_timeout {
            Some(limit) => match tokio::time::timeout(limit, stage).await {
                Ok(result) => result,
                Err(_) => Err(on_timeout(format!(
                    "stage exceeded {}s",
                    limit.as_secs_f32()
                ))),
            },
            None => stage.await,
        }
    }
}
