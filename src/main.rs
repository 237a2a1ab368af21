use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use studenflow::{
    AppConfig, ChatSession, GeminiClient, GeminiTTS, ImageAttachment, Mode, Question, Solver,
    SpeechSynthesizer, core::audio::write_wav,
};

/// StudenFlow - Computer Science tutor on top of Gemini
#[derive(Parser, Debug)]
#[command(name = "studenflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Solve a question given as text, an image, or both
    Solve {
        /// Question text
        #[arg(short = 't', long = "text")]
        text: Option<String>,

        /// Image of the question (png, jpeg, webp, gif, heic)
        #[arg(short = 'i', long = "image")]
        image: Option<PathBuf>,
    },

    /// Interactive chat (`/mode smart|lite|search`, `/quit`)
    Chat {
        /// Initial mode
        #[arg(short = 'm', long = "mode", default_value = "smart")]
        mode: String,
    },

    /// Read text aloud
    Speak {
        /// Text to speak
        text: String,

        /// Write a WAV file instead of playing through the speakers
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },

    /// Live voice call, ends on Ctrl+C
    Live,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::from_env()?
    };

    match cli.command {
        Commands::Solve { text, image } => solve(&config, text, image).await,
        Commands::Chat { mode } => chat(&config, Mode::from_str_or_default(&mode)).await,
        Commands::Speak { text, out } => speak(&config, &text, out).await,
        Commands::Live => live(&config).await,
    }
}

fn backend(config: &AppConfig) -> anyhow::Result<Arc<GeminiClient>> {
    Ok(Arc::new(GeminiClient::new(config.gemini_client_config())?))
}

async fn solve(
    config: &AppConfig,
    text: Option<String>,
    image: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut question = Question {
        text,
        image: None,
    };
    if let Some(path) = image {
        question = question.with_image(ImageAttachment::from_file(&path)?);
    }

    let solver = Solver::new(backend(config)?, config.solver_settings());
    let document = solver.solve(&question).await?;

    println!("{}\n", document.formal);
    println!("{}", document.supplementary);
    Ok(())
}

async fn chat(config: &AppConfig, mode: Mode) -> anyhow::Result<()> {
    let mut session = ChatSession::with_greeting(backend(config)?, config.chat_models());
    session.set_mode(mode);

    for turn in session.history() {
        println!("{}\n", turn.text());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("[{}] > ", session.mode());
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if line == "/quit" {
            break;
        }
        if let Some(mode) = line.strip_prefix("/mode") {
            session.set_mode(Mode::from_str_or_default(mode));
            println!("Mode: {}", session.mode());
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let reply = session.send(line).await?;
        println!("\n{}\n", reply.text());
        for citation in reply.citations() {
            println!("  [{}] {}", citation.title, citation.uri);
        }
    }

    Ok(())
}

async fn speak(config: &AppConfig, text: &str, out: Option<PathBuf>) -> anyhow::Result<()> {
    let tts = Arc::new(
        GeminiTTS::new(backend(config)?)
            .with_model(config.models.tts.clone())
            .with_voice(config.voice),
    );

    if let Some(path) = out {
        let speech = tts.synthesize(text).await?;
        let frame = speech.decode()?;
        write_wav(&path, &frame)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {:.1}s of speech to {}", frame.duration_secs(), path.display());
        return Ok(());
    }

    play_through_speakers(tts, text).await
}

#[cfg(feature = "device-audio")]
async fn play_through_speakers(tts: Arc<GeminiTTS>, text: &str) -> anyhow::Result<()> {
    use studenflow::SpeechPlayer;
    use studenflow::core::audio::CpalAudioDevice;

    let player = SpeechPlayer::new(tts, Arc::new(CpalAudioDevice::new()));
    player.play(text).await?;
    Ok(())
}

#[cfg(not(feature = "device-audio"))]
async fn play_through_speakers(_tts: Arc<GeminiTTS>, _text: &str) -> anyhow::Result<()> {
    anyhow::bail!("Speaker playback requires the `device-audio` feature; use --out FILE")
}

#[cfg(feature = "device-audio")]
async fn live(config: &AppConfig) -> anyhow::Result<()> {
    use std::time::Duration;
    use studenflow::core::audio::CpalAudioDevice;
    use studenflow::{GeminiLive, RealtimeAudioSession, SessionState};

    let session = RealtimeAudioSession::new(
        Arc::new(CpalAudioDevice::new()),
        Arc::new(GeminiLive::with_url(config.api_key.clone(), config.live_url.clone())),
        config.live_session_config(),
        config.capture_config(),
    );

    session.start().await?;
    println!("{}", session.status());

    let mut status = session.status();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let current = session.status();
                if current != status {
                    println!("{current}");
                    status = current;
                }
                if session.state() == SessionState::Idle {
                    break;
                }
            }
        }
    }

    session.stop().await;
    println!("{}", session.status());
    Ok(())
}

#[cfg(not(feature = "device-audio"))]
async fn live(_config: &AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("Live calls require the `device-audio` feature")
}
