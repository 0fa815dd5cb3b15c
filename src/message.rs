use crate::viseme::Viseme;
use serde::{Deserialize, Serialize};

/// One timed mouth shape: the mouth holds `value` from `start` to `end`
/// (seconds from the beginning of the audio). Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    pub start: f32,
    pub end: f32,
    pub value: Viseme,
}

impl MouthCue {
    pub fn new(start: f32, end: f32, value: Viseme) -> Self {
        Self { start, end, value }
    }
}

/// An ordered cue sequence covering one utterance. This is both the wire
/// shape returned to HTTP clients and the shape rhubarb writes
/// (`{"mouthCues": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSync {
    pub mouth_cues: Vec<MouthCue>,
}

impl LipSync {
    pub fn new(mouth_cues: Vec<MouthCue>) -> Self {
        Self { mouth_cues }
    }

    pub fn is_empty(&self) -> bool {
        self.mouth_cues.is_empty()
    }

    /// End of the last cue, i.e. the total span of the sequence.
    pub fn duration(&self) -> f32 {
        self.mouth_cues.last().map(|c| c.end).unwrap_or(0.0)
    }

    /// Every cue has `0 <= start < end` and starts never decrease.
    /// Consumers are promised nothing less than this.
    pub fn is_well_formed(&self) -> bool {
        let mut prev_start = 0.0f32;
        for cue in &self.mouth_cues {
            if cue.start < 0.0 || cue.end <= cue.start || cue.start < prev_start {
                return false;
            }
            prev_start = cue.start;
        }
        true
    }

    /// Uniformly scale every boundary by `factor`.
    pub fn rescale(&mut self, factor: f32) {
        for cue in &mut self.mouth_cues {
            cue.start *= factor;
            cue.end *= factor;
        }
    }
}

/// Facial expressions the dialogue source may pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacialExpression {
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
    Default,
}

/// Body animations the rendering client knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    #[serde(rename = "Talking_0")]
    Talking0,
    #[serde(rename = "Talking_1")]
    Talking1,
    #[serde(rename = "Talking_2")]
    Talking2,
    Crying,
    Laughing,
    Rumba,
    Idle,
    Terrified,
    Angry,
}

/// What the dialogue source drafts before any audio work happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub text: String,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

/// A fully processed message as returned to the HTTP client. `audio` is
/// base64 mp3; both it and `lipsync` are null when speech rendering failed
/// and the null fallback policy is in force.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
    pub audio: Option<String>,
    pub lipsync: Option<LipSync>,
}

impl Message {
    pub fn from_draft(draft: MessageDraft) -> Self {
        Self {
            text: draft.text,
            facial_expression: draft.facial_expression,
            animation: draft.animation,
            audio: None,
            lipsync: None,
        }
    }
}
