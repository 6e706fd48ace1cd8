use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cookie_voice::command;
use cookie_voice::integrations::BackendClient;
use cookie_voice::voice::{
    AudioCapture, Listener, MicrophoneListener, SpeechToText, SystemSpeaker, calculate_energy,
    list_input_devices,
};
use cookie_voice::{Config, Dispatcher, ListenError, Session};

/// Cookie - voice commands for the agent analytics dashboard
#[derive(Parser)]
#[command(name = "cookie", version, about)]
struct Cli {
    /// Chrome remote debugging address (host:port)
    #[arg(long, env = "COOKIE_DEBUGGER_ADDRESS")]
    debugger_address: Option<String>,

    /// Wake word that must start every command
    #[arg(long, env = "COOKIE_WAKE_WORD")]
    wake_word: Option<String>,

    /// Input device index (see `cookie test-mic`)
    #[arg(long, env = "COOKIE_MIC_DEVICE")]
    device: Option<usize>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for voice commands (default)
    Listen,
    /// List input devices, show a level meter and transcribe one utterance
    TestMic {
        /// Meter duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Print the intents a transcript maps to, without executing them
    Parse {
        /// Transcript, including the wake word
        text: Vec<String>,
    },
    /// Check that the backend API is reachable
    CheckBackend,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,cookie_voice=info",
        1 => "info,cookie_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(address) = cli.debugger_address {
        config.debugger_address = address;
    }
    if let Some(word) = cli.wake_word {
        config.voice.wake_word = word.trim().to_lowercase();
    }
    if cli.device.is_some() {
        config.voice.device_index = cli.device;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Listen) {
        Command::Listen => listen(config).await,
        Command::TestMic { duration } => test_mic(&config, duration).await,
        Command::Parse { text } => {
            parse(&config, &text.join(" "));
            Ok(())
        }
        Command::CheckBackend => check_backend(&config).await,
    }
}

#[allow(clippy::future_not_send)]
async fn listen(config: Config) -> anyhow::Result<()> {
    let stt = whisper(&config)?;
    let mut listener = MicrophoneListener::new(&config.voice, stt)?;
    let speaker = Arc::new(SystemSpeaker::new(&config.voice.speech_command));

    tracing::info!(
        debugger = config.debugger_address,
        api = config.endpoints.api_url,
        wake_word = config.voice.wake_word,
        "starting voice assistant"
    );

    // Without the browser no intent can run
    let session = Session::connect(config, speaker)
        .await
        .context("cannot attach to Chrome; start it with --remote-debugging-port")?;

    let mut dispatcher = Dispatcher::new(session);
    dispatcher.run(&mut listener).await?;

    tracing::info!("shutting down voice assistant");
    Ok(())
}

fn whisper(config: &Config) -> anyhow::Result<SpeechToText> {
    let key = config
        .voice
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is required for speech recognition")?;
    Ok(SpeechToText::new_whisper(key, config.voice.stt_model.clone())?)
}

fn parse(config: &Config, text: &str) {
    for intent in command::parse_all_with_wake_word(text, &config.voice.wake_word) {
        println!("{intent:?}");
    }
}

async fn check_backend(config: &Config) -> anyhow::Result<()> {
    let backend = BackendClient::new(
        config.endpoints.api_url.clone(),
        config.endpoints.api_key.clone(),
    );
    backend.health(config.timing.health_timeout).await?;
    println!("Backend at {} is reachable", backend.base_url());
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Available input devices:");
    for device in list_input_devices()? {
        println!("  {}: {}", device.index, device.name);
    }

    println!("\nTesting microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new(config.voice.device_index)?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();
    drop(capture);
    println!(
        "\nSpeech threshold is {:.4}; speak above it to be heard.",
        config.voice.energy_threshold
    );

    let Ok(stt) = whisper(config) else {
        println!("Set OPENAI_API_KEY to also test transcription.");
        return Ok(());
    };

    let mut listener = MicrophoneListener::new(&config.voice, stt)?;
    println!("\nNow say something! (You have {} seconds)", config.voice.listen_timeout.as_secs());

    match listener.listen().await {
        Ok(text) => println!("You said: {text}"),
        Err(ListenError::NoSpeech) => println!("No speech detected within timeout"),
        Err(ListenError::Unintelligible) => println!("Could not understand the audio"),
        Err(ListenError::ServiceUnavailable(e)) => println!("Could not request results; {e}"),
    }

    Ok(())
}
