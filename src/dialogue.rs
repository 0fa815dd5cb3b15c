use crate::error::{PipelineError, Result};
use crate::message::MessageDraft;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const MODEL: &str = "gpt-3.5-turbo-1106";

const SYSTEM_PROMPT: &str = "\
You are a virtual mentor for kids of age 6-18.\n\
You will always reply with a JSON array of messages (max 6).\n\
Each message has a text, facialExpression, and animation property.\n\
The different facial expressions are: smile, sad, angry, surprised, funnyFace, and default.\n\
The different animations are: Talking_0, Talking_1, Talking_2, Crying, Laughing, Rumba, Idle, Terrified, and Angry.";

/// Drafting seam: given one user turn, produce the ordered message drafts
/// the pipeline will voice.
#[async_trait]
pub trait DialogueSource: Send + Sync {
    async fn draft(&self, user_message: &str) -> Result<Vec<MessageDraft>>;
}

/// OpenAI chat-completions dialogue source.
pub struct OpenAiDialogue {
    client: Client,
    api_key: String,
}

impl OpenAiDialogue {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// The model is told to emit a JSON object; it sometimes wraps the array in
/// `{"messages": [...]}` and sometimes emits the array bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum DraftPayload {
    Wrapped { messages: Vec<MessageDraft> },
    Bare(Vec<MessageDraft>),
}

#[async_trait]
impl DialogueSource for OpenAiDialogue {
    async fn draft(&self, user_message: &str) -> Result<Vec<MessageDraft>> {
        let body = json!({
            "model": MODEL,
            "max_tokens": 1000,
            "temperature": 0.6,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message },
            ],
        });

        debug!(chars = user_message.len(), "drafting dialogue");
        let response = self
            .client
            .post(format!("{OPENAI_BASE}/chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::UpstreamDialogueFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::UpstreamDialogueFailed(format!(
                "openai returned {}",
                response.status()
            )));
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|e| PipelineError::UpstreamDialogueFailed(e.to_string()))?;
        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| {
                PipelineError::UpstreamDialogueFailed("completion had no choices".to_string())
            })?;

        let payload: DraftPayload = serde_json::from_str(content)
            .map_err(|e| PipelineError::UpstreamDialogueFailed(format!("bad draft json: {e}")))?;
        let drafts = match payload {
            DraftPayload::Wrapped { messages } => messages,
            DraftPayload::Bare(messages) => messages,
        };
        Ok(drafts)
    }
}
