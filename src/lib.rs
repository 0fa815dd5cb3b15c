//! Backend for a talking 3D mentor avatar: drafts replies with a language
//! model, voices them with an external speech renderer, and — the core of
//! this crate — turns each rendered waveform into time-aligned mouth-shape
//! cues for the rendering client.
//!
//! The cue pipeline runs an external forced aligner (rhubarb) over a
//! transcoded waveform; when any stage of that path is unavailable or
//! fails, a deterministic text-based synthesizer estimates the timing
//! instead, so every message ships with usable cues.

pub mod align;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod fallback;
pub mod message;
pub mod pipeline;
pub mod resolver;
pub mod server;
pub mod transcode;
pub mod tts;
pub mod viseme;

pub use config::{AppConfig, FallbackPolicy};
pub use error::PipelineError;
pub use message::{Animation, FacialExpression, LipSync, Message, MessageDraft, MouthCue};
pub use pipeline::LipSyncPipeline;
pub use viseme::Viseme;
