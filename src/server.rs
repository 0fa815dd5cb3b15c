use crate::align;
use crate::config::AppConfig;
use crate::dialogue::DialogueSource;
use crate::message::{Animation, FacialExpression, Message};
use crate::pipeline::LipSyncPipeline;
use crate::tts::{self, SpeechRenderer};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub cfg: AppConfig,
    pub pipeline: LipSyncPipeline,
    pub dialogue: Option<Arc<dyn DialogueSource>>,
    pub renderer: Option<Arc<dyn SpeechRenderer>>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cfg);
    Router::new()
        .route("/", get(root))
        .route("/voices", get(voices))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.cfg.host, state.cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "virtual mentor listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let cfg = cfg.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| cfg.allows_origin(o))
                .unwrap_or(false)
        }))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn root() -> &'static str {
    "Hello World!"
}

async fn voices(State(state): State<Arc<AppState>>) -> Response {
    let Some(api_key) = state.cfg.eleven_labs_api_key.as_deref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "ElevenLabs API key is not configured.",
        );
    };
    match tts::list_voices(api_key).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => {
            error!(error = %e, "voice listing failed");
            error_response(StatusCode::BAD_GATEWAY, "Could not fetch voices.")
        }
    }
}

async fn chat(State(state): State<Arc<AppState>>, Json(body): Json<ChatRequest>) -> Response {
    let user_message = body.message.as_deref().map(str::trim).unwrap_or("");

    // No prompt: greet with the canned sample if it exists on disk.
    if user_message.is_empty() {
        return Json(json!({ "messages": [greeting_message(&state).await] })).into_response();
    }

    // Without credentials the system still answers, as text only.
    if !state.cfg.has_voice_keys() {
        warn!("api keys missing, returning text-only response");
        return Json(json!({ "messages": [keyless_message(user_message)] })).into_response();
    }

    let (Some(dialogue), Some(renderer)) = (state.dialogue.as_ref(), state.renderer.as_ref())
    else {
        return Json(json!({ "messages": [keyless_message(user_message)] })).into_response();
    };

    let drafts = match dialogue.draft(user_message).await {
        Ok(drafts) => drafts,
        Err(e) => {
            // The drafting call is the one collaborator whose failure is
            // fatal for the whole request.
            error!(error = %e, "dialogue drafting failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing your request.",
            );
        }
    };

    let messages = state.pipeline.process_batch(drafts, renderer.as_ref()).await;
    Json(json!({ "messages": messages })).into_response()
}

/// Greeting for an empty prompt; sample audio and cues are attached when
/// the sample directory holds them, nulls otherwise.
async fn greeting_message(state: &AppState) -> Message {
    let mut message = Message {
        text: "Hi there! You can call me MentorBot.".to_string(),
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking1,
        audio: None,
        lipsync: None,
    };

    if let Some(dir) = &state.cfg.sample_dir {
        let audio = tokio::fs::read(dir.join("message_0.mp3")).await;
        let cues = align::read_cue_file(&dir.join("message_0.json")).await;
        match (audio, cues) {
            (Ok(bytes), Ok(lipsync)) => {
                message.audio = Some(BASE64.encode(bytes));
                message.lipsync = Some(lipsync);
            }
            (audio, cues) => {
                if let Err(e) = audio {
                    warn!(error = %e, "sample audio unavailable");
                }
                if let Err(e) = cues {
                    warn!(error = %e, "sample cues unavailable");
                }
                message.text = "Hello! How can I help you today?".to_string();
            }
        }
    }

    message
}

fn keyless_message(user_message: &str) -> Message {
    Message {
        text: format!(
            "I received your message: \"{user_message}\". However, I need API keys to \
             provide voice responses. Please configure OpenAI and ElevenLabs API keys."
        ),
        facial_expression: FacialExpression::Default,
        animation: Animation::Idle,
        audio: None,
        lipsync: None,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
