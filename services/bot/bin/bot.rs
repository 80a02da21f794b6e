//! Main Entrypoint for the Pixel Bot
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Validating the music folder and sound effects.
//! 3. Building the provider clients and opening the audio output.
//! 4. Starting the engine loops and the Twitch chat session.
//! 5. Shutting everything down cleanly on Ctrl+C.

use anyhow::Context;
use pixel_bot::{
    audio::RodioMixer,
    chat::twitch::TwitchChat,
    config::Config,
    providers::{azure::AzureSpeech, gemini::GeminiClient, reddit::RedditClient},
    resources,
};
use pixel_core::engine::{Collaborators, Engine};
use pixel_core::mixer::Mixer;
use std::sync::Arc;
use tracing::{error, info};

/// Listens for the `Ctrl+C` signal to gracefully shut down the bot.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Checking resources...");

    serve(config).inspect_err(|e| error!(error = ?e, "Fatal error"))
}

/// Everything after logging is up, so failures here reach the log.
fn serve(config: Config) -> anyhow::Result<()> {
    // --- 3. Validate Resources ---
    let library = resources::validate(&config.music_folder, &config.stinger)
        .context("Required audio resources are missing")?;
    info!(
        folder = %config.music_folder.display(),
        stinger = %config.stinger.display(),
        "Audio resources found."
    );

    // --- 4. Initialize Providers and Audio ---
    // Blocking HTTP clients are built and dropped outside the async runtime.
    let content = Arc::new(
        RedditClient::new(config.reddit.clone()).context("Failed to build Reddit client")?,
    );
    let reactions = Arc::new(
        GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())
            .context("Failed to build Gemini client")?,
    );
    let speech = Arc::new(
        AzureSpeech::new(config.azure_speech_key.clone(), &config.azure_speech_region)
            .context("Failed to build Azure Speech client")?,
    );
    let mixer = Arc::new(
        RodioMixer::open(config.music_volume_normal).context("Failed to open audio output")?,
    );
    mixer.set_background_volume(config.music_volume_normal);

    let collaborators = Collaborators {
        content: content.clone(),
        reactions: reactions.clone(),
        speech: speech.clone(),
        mixer: mixer.clone(),
    };

    // --- 5. Run ---
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    runtime.block_on(async {
        let engine = Engine::start(collaborators, library, config.engine_settings());
        let chat = TwitchChat::new(
            config.twitch.clone(),
            config.command_prefix.clone(),
            engine.command_handler(),
        );
        let chat_task = tokio::spawn(chat.run(engine.cancel_token().child_token()));
        info!(
            channel = %config.twitch.channel,
            subreddit = %config.subreddit,
            "Pixel is live."
        );

        shutdown_signal().await;
        engine.shutdown().await;
        if let Err(e) = chat_task.await {
            error!(error = %e, "Chat task ended abnormally");
        }
    });
    drop(runtime);

    mixer.close();
    drop((content, reactions, speech));
    info!("Shutdown complete.");
    Ok(())
}
