use clap::{Parser, Subcommand};
use mentor_face::config::AppConfig;
use mentor_face::dialogue::{DialogueSource, OpenAiDialogue};
use mentor_face::pipeline::LipSyncPipeline;
use mentor_face::resolver::ExecutableResolver;
use mentor_face::server::{self, AppState};
use mentor_face::tts::{ElevenLabsRenderer, SpeechRenderer};
use mentor_face::{fallback, LipSync};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mentor-face")]
#[command(about = "Virtual mentor backend: chat, speech, and lip-sync cue generation")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "3000", env = "PORT")]
        port: u16,
    },

    /// Generate lip-sync cues for a piece of text, printed as JSON
    Cues {
        /// Text to generate cues for
        text: String,

        /// Audio file to align against (omit to estimate timing from text)
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Target duration in seconds (only used without --audio)
        #[arg(short, long)]
        duration: Option<f32>,

        /// Write the cue JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { host, port } => {
            let mut cfg = AppConfig::from_env();
            cfg.host = host;
            cfg.port = port;
            run_server(cfg).await
        }
        Commands::Cues {
            text,
            audio,
            duration,
            output,
        } => run_cues(text, audio, duration, output).await,
    }
}

async fn run_server(cfg: AppConfig) -> anyhow::Result<()> {
    let resolver = ExecutableResolver::resolve(&cfg).await;
    let pipeline = LipSyncPipeline::new(&cfg, resolver);

    let dialogue: Option<Arc<dyn DialogueSource>> = cfg
        .openai_api_key
        .clone()
        .map(|key| Arc::new(OpenAiDialogue::new(key)) as Arc<dyn DialogueSource>);
    let renderer: Option<Arc<dyn SpeechRenderer>> = cfg
        .eleven_labs_api_key
        .clone()
        .map(|key| Arc::new(ElevenLabsRenderer::new(key, cfg.voice_id.clone())) as Arc<dyn SpeechRenderer>);

    let state = Arc::new(AppState {
        cfg,
        pipeline,
        dialogue,
        renderer,
    });
    server::serve(state).await
}

async fn run_cues(
    text: String,
    audio: Option<PathBuf>,
    duration: Option<f32>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    let lipsync: LipSync = match audio {
        Some(path) => {
            let resolver = ExecutableResolver::resolve(&cfg).await;
            let pipeline = LipSyncPipeline::new(&cfg, resolver);
            pipeline
                .produce_lipsync(&text, Some(&path))
                .await
                .unwrap_or_default()
        }
        None => {
            let target = duration.unwrap_or_else(|| fallback::estimate_duration(&text));
            fallback::synthesize(&text, target)
        }
    };

    let json = serde_json::to_string_pretty(&lipsync)?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            println!("Cues written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
