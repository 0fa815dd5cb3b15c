use async_trait::async_trait;
use mentor_face::align::read_cue_file;
use mentor_face::config::{AppConfig, FallbackPolicy};
use mentor_face::error::{PipelineError, Result};
use mentor_face::message::{Animation, FacialExpression, MessageDraft};
use mentor_face::pipeline::LipSyncPipeline;
use mentor_face::resolver::ExecutableResolver;
use mentor_face::tts::SpeechRenderer;
use mentor_face::Viseme;
use std::path::PathBuf;

/// Renderer stub that fails whenever the text contains `[fail]`.
struct StubRenderer;

#[async_trait]
impl SpeechRenderer for StubRenderer {
    async fn render(&self, text: &str) -> Result<Vec<u8>> {
        if text.contains("[fail]") {
            Err(PipelineError::SynthesisUnavailable(
                "stubbed failure".to_string(),
            ))
        } else {
            // Not real mp3, but the pipeline only moves bytes around.
            Ok(vec![0u8; 64])
        }
    }
}

fn draft(text: &str) -> MessageDraft {
    MessageDraft {
        text: text.to_string(),
        facial_expression: FacialExpression::Smile,
        animation: Animation::Talking0,
    }
}

fn test_config(scratch: &tempfile::TempDir) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.scratch_dir = scratch.path().to_path_buf();
    cfg
}

/// No resolved executables at all: the aligner path cannot start.
fn unresolved() -> ExecutableResolver {
    ExecutableResolver::default()
}

/// Executables "resolved" to paths that do not exist, so spawning fails.
fn broken() -> ExecutableResolver {
    ExecutableResolver {
        ffmpeg: Some(PathBuf::from("/nonexistent/ffmpeg")),
        rhubarb: Some(PathBuf::from("/nonexistent/rhubarb")),
    }
}

#[tokio::test]
async fn test_fallback_triggers_on_alignment_failure() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let audio_path = scratch.path().join("input.mp3");
    tokio::fs::write(&audio_path, b"not really audio")
        .await
        .expect("write audio");

    let cfg = test_config(&scratch);
    let pipeline = LipSyncPipeline::new(&cfg, broken());

    let lipsync = pipeline
        .produce_lipsync("hello there", Some(&audio_path))
        .await
        .expect("fallback should always produce cues");
    assert!(!lipsync.is_empty(), "fallback cues should not be empty");
    assert!(lipsync.is_well_formed(), "fallback cues must be well formed");
}

#[tokio::test]
async fn test_fallback_triggers_when_aligner_missing() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let audio_path = scratch.path().join("input.mp3");
    tokio::fs::write(&audio_path, b"bytes").await.expect("write");

    let cfg = test_config(&scratch);
    let pipeline = LipSyncPipeline::new(&cfg, unresolved());

    let lipsync = pipeline
        .produce_lipsync("hello there", Some(&audio_path))
        .await
        .expect("missing aligner should route to fallback");
    assert!(lipsync.is_well_formed());
}

#[tokio::test]
async fn test_no_audio_estimates_from_text() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(&scratch);
    let pipeline = LipSyncPipeline::new(&cfg, unresolved());

    let lipsync = pipeline
        .produce_lipsync("hello world", None)
        .await
        .expect("text-only path should still produce cues");
    assert!(!lipsync.is_empty());
    assert!(lipsync.is_well_formed());
}

#[tokio::test]
async fn test_batch_isolation() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(&scratch);
    let pipeline = LipSyncPipeline::new(&cfg, unresolved());

    let drafts = vec![
        draft("first message"),
        draft("second [fail] message"),
        draft("third message"),
    ];
    let messages = pipeline.process_batch(drafts, &StubRenderer).await;

    assert_eq!(messages.len(), 3, "every draft should come back");

    // The failed message ships without audio but with fallback cues.
    assert!(messages[1].audio.is_none(), "failed render means no audio");
    let failed_cues = messages[1].lipsync.as_ref().expect("fallback cues");
    assert!(failed_cues.is_well_formed());

    // Its neighbours are unaffected.
    for i in [0usize, 2] {
        assert!(messages[i].audio.is_some(), "message {i} should have audio");
        let cues = messages[i].lipsync.as_ref().expect("cues");
        assert!(cues.is_well_formed());
    }
}

#[tokio::test]
async fn test_null_fallback_policy() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let mut cfg = test_config(&scratch);
    cfg.fallback_policy = FallbackPolicy::Null;
    let pipeline = LipSyncPipeline::new(&cfg, unresolved());

    let messages = pipeline
        .process_batch(vec![draft("some [fail] text")], &StubRenderer)
        .await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].audio.is_none());
    assert!(
        messages[0].lipsync.is_none(),
        "null policy should attach no cues instead of synthesizing"
    );
}

#[tokio::test]
async fn test_cue_file_parsing() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let path = scratch.path().join("cues.json");
    tokio::fs::write(
        &path,
        r#"{
          "metadata": { "soundFile": "message_0.wav", "duration": 1.5 },
          "mouthCues": [
            { "start": 0.00, "end": 0.35, "value": "X" },
            { "start": 0.35, "end": 0.80, "value": "B" },
            { "start": 0.80, "end": 1.50, "value": "E" }
          ]
        }"#,
    )
    .await
    .expect("write cue file");

    let lipsync = read_cue_file(&path).await.expect("should parse");
    assert_eq!(lipsync.mouth_cues.len(), 3);
    assert_eq!(lipsync.mouth_cues[0].value, Viseme::Rest);
    assert_eq!(lipsync.mouth_cues[1].value, Viseme::Alveolar);
    assert!((lipsync.duration() - 1.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_malformed_cue_file_is_alignment_failure() {
    let scratch = tempfile::tempdir().expect("tempdir");
    let path = scratch.path().join("cues.json");
    tokio::fs::write(&path, b"{ not json").await.expect("write");

    let err = read_cue_file(&path).await.expect_err("must reject garbage");
    assert!(matches!(err, PipelineError::AlignmentFailed(_)));

    // Structurally valid json with inverted cue boundaries is also rejected:
    // a malformed sequence must never reach a consumer.
    tokio::fs::write(
        &path,
        r#"{ "mouthCues": [ { "start": 1.0, "end": 0.5, "value": "A" } ] }"#,
    )
    .await
    .expect("write");
    let err = read_cue_file(&path).await.expect_err("must reject inverted");
    assert!(matches!(err, PipelineError::AlignmentFailed(_)));

    let missing = scratch.path().join("never_written.json");
    let err = read_cue_file(&missing).await.expect_err("must reject missing");
    assert!(matches!(err, PipelineError::AlignmentFailed(_)));
}

#[tokio::test]
async fn test_wire_format_round_trip() {
    let lipsync = mentor_face::fallback::synthesize("hello", 2.0);
    let json = serde_json::to_string(&lipsync).expect("serialize");
    assert!(
        json.starts_with(r#"{"mouthCues":"#),
        "wire shape should use the mouthCues key: {json}"
    );
    assert!(json.contains(r#""value":"#), "cues carry letter values");
}
