use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use intake_gateway::{
    Config, ConsoleTransport, Daemon, DialogueSession, IntakeStore, SlotFillingEngine,
    TextToSpeech,
};

/// Intake - voice-driven collector for scripted orders and check-ins
#[derive(Parser)]
#[command(name = "intake", version, about)]
struct Cli {
    /// Intake script to run (e.g. "coffee", "wellness")
    #[arg(short, long, env = "INTAKE_SCRIPT", default_value = "coffee")]
    script: String,

    /// Port to listen on
    #[arg(long, env = "INTAKE_PORT", default_value = "18990")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (text turns only)
    #[arg(long, env = "INTAKE_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive keyboard session
    Console,
    /// List available embedded scripts
    Scripts,
    /// Show recorded entries for the active script
    Log,
    /// Test TTS output
    TestTts {
        /// Text to synthesize
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,intake_gateway=info",
        1 => "info,intake_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Console => console(&cli.script).await,
            Command::Scripts => cmd_scripts(),
            Command::Log => cmd_log(&cli.script),
            Command::TestTts { text } => test_tts(&cli.script, &text).await,
        };
    }

    tracing::info!(
        script = %cli.script,
        port = cli.port,
        disable_voice = cli.disable_voice,
        "starting intake gateway"
    );

    let config = Config::load_with_options(&cli.script, cli.disable_voice)?;
    let voice_enabled = config.voice.enabled;
    let title = config.script.title.clone();

    let daemon = Daemon::new(config, cli.port);

    if voice_enabled {
        tracing::info!("intake gateway ready - collecting \"{title}\"");
    } else {
        tracing::info!("intake gateway ready (text-only mode, voice disabled)");
    }

    daemon.run().await?;

    Ok(())
}

/// Run a keyboard session against the active script
async fn console(script_id: &str) -> anyhow::Result<()> {
    let config = Config::load(script_id)?;
    let store = IntakeStore::new(config.log_path.clone());
    let engine = SlotFillingEngine::new(Arc::new(config.script), store)?;

    println!("(type answers, ctrl-d to quit)\n");
    DialogueSession::new(ConsoleTransport::new(), engine)
        .run()
        .await?;

    Ok(())
}

/// List embedded scripts
fn cmd_scripts() -> anyhow::Result<()> {
    for (id, _) in Config::embedded_scripts() {
        let script = Config::load_embedded_script(id)?;
        println!("{id:>10}  {} ({} fields)", script.title, script.fields.len());
    }
    Ok(())
}

/// Print recorded entries for the active script
fn cmd_log(script_id: &str) -> anyhow::Result<()> {
    let config = Config::load(script_id)?;
    let store = IntakeStore::new(config.log_path.clone());

    let entries = store.load();
    if entries.is_empty() {
        println!("no entries in {}", config.log_path.display());
        return Ok(());
    }

    for entry in &entries {
        let date = entry.get("date").and_then(|v| v.as_str()).unwrap_or("-");
        let summary = entry.get("summary").and_then(|v| v.as_str()).unwrap_or("-");
        println!("{date}  {summary}");
    }
    println!("\n{} entries in {}", entries.len(), config.log_path.display());

    Ok(())
}

/// Synthesize sample text and report the result
async fn test_tts(script_id: &str, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load(script_id)?;
    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;

    println!("Synthesizing speech...");
    let audio = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", audio.len());

    let out = std::env::temp_dir().join("intake_tts_test.mp3");
    std::fs::write(&out, &audio)?;
    println!("Wrote {}", out.display());

    Ok(())
}
