use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

const ELEVEN_LABS_BASE: &str = "https://api.elevenlabs.io/v1";

/// Speech rendering seam. The pipeline only ever needs "text in, audio
/// bytes out or an error"; tests stub this to exercise the failure paths.
#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    async fn render(&self, text: &str) -> Result<Vec<u8>>;
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsRenderer {
    client: Client,
    api_key: String,
    voice_id: String,
}

impl ElevenLabsRenderer {
    pub fn new(api_key: String, voice_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            voice_id,
        }
    }
}

#[async_trait]
impl SpeechRenderer for ElevenLabsRenderer {
    async fn render(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/text-to-speech/{}", ELEVEN_LABS_BASE, self.voice_id);
        debug!(voice = %self.voice_id, chars = text.len(), "rendering speech");
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| PipelineError::SynthesisUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::SynthesisUnavailable(format!(
                "elevenlabs returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::SynthesisUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Fetch the account's voice list, passed through verbatim to HTTP clients.
pub async fn list_voices(api_key: &str) -> Result<serde_json::Value> {
    let response = Client::new()
        .get(format!("{ELEVEN_LABS_BASE}/voices"))
        .header("xi-api-key", api_key)
        .send()
        .await
        .map_err(|e| PipelineError::SynthesisUnavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PipelineError::SynthesisUnavailable(format!(
            "elevenlabs returned {}",
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| PipelineError::SynthesisUnavailable(e.to_string()))
}
