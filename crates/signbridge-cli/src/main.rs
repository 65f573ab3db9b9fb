//! Signbridge command-line entry point.
//!
//! `signbridge run` starts one conversation session and the live
//! recognition pipeline; `signbridge sessions …` is the management surface
//! over the conversation store.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use signbridge_core::Sender;
use signbridge_pipeline::RecognitionPipeline;
use signbridge_session::{HttpConversationStore, SessionManager, SessionState};
use signbridge_vision::{CameraSource, FrameSource, SignClassifier};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signbridge", about = "Signbridge — sign-language conversation assistant")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "signbridge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a conversation session with live sign recognition
    Run,
    /// Manage persisted conversations
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List all persisted conversations
    List,
    /// Show one conversation
    Show {
        /// Session identifier
        id: uuid::Uuid,
    },
    /// Delete one conversation
    Delete {
        /// Session identifier
        id: uuid::Uuid,
    },
}

// ── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
struct SignbridgeConfig {
    #[serde(default)]
    model: ModelConfig,
    #[serde(default)]
    camera: CameraConfig,
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    pipeline: PipelineConfig,
    #[serde(default)]
    chat: ChatConfig,
}

#[derive(Debug, Deserialize)]
struct ModelConfig {
    #[serde(default = "default_model_path")]
    path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CameraConfig {
    #[serde(default)]
    device_index: usize,
    #[serde(default = "default_camera_width")]
    width: u32,
    #[serde(default = "default_camera_height")]
    height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: default_camera_width(),
            height: default_camera_height(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoreConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipelineConfig {
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatConfig {
    #[serde(default = "default_greeting")]
    greeting: String,
    #[serde(default = "default_agent_reply")]
    agent_reply: String,
    #[serde(default = "default_agent_reply_delay_ms")]
    agent_reply_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            agent_reply: default_agent_reply(),
            agent_reply_delay_ms: default_agent_reply_delay_ms(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/model.json")
}
fn default_camera_width() -> u32 {
    640
}
fn default_camera_height() -> u32 {
    480
}
fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_greeting() -> String {
    "Hello! I am here to help. How can I assist you today?".to_string()
}
fn default_agent_reply() -> String {
    "I have received your message. How else can I help?".to_string()
}
fn default_agent_reply_delay_ms() -> u64 {
    1000
}

async fn load_config(path: &PathBuf) -> anyhow::Result<SignbridgeConfig> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        }),
        Err(_) => {
            info!(path = %path.display(), "no config file found, using defaults");
            Ok(SignbridgeConfig::default())
        }
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Sessions { action } => sessions(action, &config).await,
    }
}

/// Starts a session and streams: every tick accumulates recognized signs
/// into the text buffer; pressing Enter confirms the buffer as a client
/// message, which the agent acknowledges; `quit` stops streaming and ends
/// the session.
async fn run(config: SignbridgeConfig) -> anyhow::Result<()> {
    let classifier = Arc::new(SignClassifier::new(&config.model.path));
    if let Err(error) = classifier.load().await {
        // Degraded start: ticks are skipped until a later reload succeeds.
        warn!(%error, "model load failed, classification disabled");
    }

    let source: Arc<dyn FrameSource> = Arc::new(CameraSource::open(
        config.camera.device_index,
        config.camera.width,
        config.camera.height,
    )?);

    let store = Arc::new(HttpConversationStore::new(&config.store.base_url));
    let mut manager = SessionManager::new(store, &config.chat.greeting);
    let session_id = manager.start()?;
    println!("agent: {}", config.chat.greeting);

    let pipeline = RecognitionPipeline::new(
        classifier,
        source,
        Duration::from_millis(config.pipeline.tick_interval_ms),
    );
    let handle = pipeline.start();
    info!(%session_id, "streaming started");
    println!("Sign at the camera. Press Enter to send the accumulated text, or type 'quit' to finish.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if matches!(line.trim(), "quit" | "q") {
            break;
        }

        let text = handle.take_text().await;
        if text.trim().is_empty() {
            println!("(nothing accumulated yet)");
            continue;
        }

        manager.add_message(Sender::Client, &text)?;
        println!("you: {text}");

        tokio::time::sleep(Duration::from_millis(config.chat.agent_reply_delay_ms)).await;
        manager.add_message(Sender::Agent, &config.chat.agent_reply)?;
        println!("agent: {}", config.chat.agent_reply);
    }

    handle.stop().await;
    manager.end()?;
    if manager.state() == SessionState::Ended {
        info!(%session_id, "session ended");
    } else {
        info!(%session_id, "session had no exchanges, left open");
    }
    manager.flush().await;
    Ok(())
}

/// The conversation management surface over the store's get/list/delete.
async fn sessions(action: SessionsAction, config: &SignbridgeConfig) -> anyhow::Result<()> {
    use signbridge_session::ConversationStore;

    let store = HttpConversationStore::new(&config.store.base_url);
    match action {
        SessionsAction::List => {
            let sessions = store.list().await?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        SessionsAction::Show { id } => {
            let session = store.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        SessionsAction::Delete { id } => {
            store.delete(id).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}
