use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// What to attach when both transcode+align and the configured recovery
/// path have failed for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Estimate cue timing from the message text. Default.
    Synthesize,
    /// Attach `lipsync: null` and let the renderer hold a rest pose.
    Null,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy::Synthesize
    }
}

/// Process configuration, built once at startup and passed by reference.
/// Nothing in the crate reads the environment after this is constructed.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub eleven_labs_api_key: Option<String>,
    pub voice_id: String,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    /// Directory for per-run scratch files (mp3/wav/cue json).
    pub scratch_dir: PathBuf,
    /// Explicit executable overrides; unset means probe the usual locations.
    pub ffmpeg_path: Option<PathBuf>,
    pub rhubarb_path: Option<PathBuf>,
    pub fallback_policy: FallbackPolicy,
    /// Bound on each subprocess stage. Unset reproduces the original
    /// behavior of waiting indefinitely.
    pub stage_timeout: Option<Duration>,
    /// When set, a transcode failure routes straight to the fallback
    /// synthesizer instead of trying the aligner on the raw audio.
    pub transcode_required: bool,
    /// Canned greeting assets (message_0.mp3 / message_0.json) served when
    /// the client sends an empty message.
    pub sample_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            eleven_labs_api_key: None,
            voice_id: "ymu001dDcWSSzffANts3".to_string(),
            allowed_origins: default_origins(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            scratch_dir: env::temp_dir(),
            ffmpeg_path: None,
            rhubarb_path: None,
            fallback_policy: FallbackPolicy::default(),
            stage_timeout: None,
            transcode_required: false,
            sample_dir: None,
        }
    }
}

fn default_origins() -> Vec<String> {
    vec![
        "https://virtual-mentor-frontend.vercel.app".to_string(),
        "https://mentor-frontend.vercel.app".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

impl AppConfig {
    /// Read everything from the environment in one place.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.openai_api_key = non_empty(env::var("OPENAI_API_KEY").ok());
        cfg.eleven_labs_api_key = non_empty(env::var("ELEVEN_LABS_API_KEY").ok());
        if let Some(voice) = non_empty(env::var("ELEVEN_LABS_VOICE_ID").ok()) {
            cfg.voice_id = voice;
        }
        if let Some(origins) = non_empty(env::var("ALLOWED_ORIGINS").ok()) {
            cfg.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse() {
                cfg.port = port;
            }
        }
        if let Some(dir) = non_empty(env::var("SCRATCH_DIR").ok()) {
            cfg.scratch_dir = PathBuf::from(dir);
        }
        cfg.ffmpeg_path = non_empty(env::var("FFMPEG_PATH").ok()).map(PathBuf::from);
        cfg.rhubarb_path = non_empty(env::var("RHUBARB_PATH").ok()).map(PathBuf::from);
        if let Ok(policy) = env::var("FALLBACK_POLICY") {
            cfg.fallback_policy = match policy.to_ascii_lowercase().as_str() {
                "null" => FallbackPolicy::Null,
                _ => FallbackPolicy::Synthesize,
            };
        }
        if let Ok(secs) = env::var("STAGE_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                cfg.stage_timeout = Some(Duration::from_secs(secs));
            }
        }
        cfg.transcode_required = env::var("TRANSCODE_REQUIRED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        cfg.sample_dir = non_empty(env::var("SAMPLE_AUDIO_DIR").ok()).map(PathBuf::from);
        cfg
    }

    /// Both upstream credentials are present, so voice-bearing responses
    /// are possible.
    pub fn has_voice_keys(&self) -> bool {
        self.openai_api_key.is_some() && self.eleven_labs_api_key.is_some()
    }

    /// Origin allow-list check for CORS. Trailing slashes are normalized so
    /// `https://a.example/` and `https://a.example` match the same entry.
    pub fn allows_origin(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed_origins
            .iter()
            .any(|allowed| allowed.trim_end_matches('/') == origin)
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
