//! Push-to-talk voice dictation daemon — application entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`LOG_LEVEL`, falling back to `info`).
//! 2. Load [`AppConfig`] from disk (returns default on first run) and
//!    validate it.
//! 3. Create the `tokio` multi-thread runtime.
//! 4. Build every long-lived component and register it with the
//!    [`Registry`] in dependency order.
//! 5. Run [`Registry::initialize_all`] — a failure here rolls back cleanly
//!    and exits with a non-zero status.
//! 6. Spawn the hotkey listener thread and the [`PipelineController`]'s
//!    event loop.
//! 7. Block on a Ctrl-C signal, then run [`Registry::shutdown_all`] and
//!    exit 0.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use juno_dictation::ai::{AiCommandProcessor, OpenAiLlmProvider};
use juno_dictation::config::AppConfig;
use juno_dictation::hotkey::{parse_key, HotkeyListener};
use juno_dictation::insertion::InsertionEngine;
use juno_dictation::notify::LogNotificationSink;
use juno_dictation::pipeline::PipelineController;
use juno_dictation::recorder::Recorder;
use juno_dictation::registry::Registry;
use juno_dictation::selection::SelectionReader;
use juno_dictation::transcription::{OpenAiSttProvider, TranscriptionOrchestrator};

/// Key watched when the configured shortcut doesn't parse, so the daemon
/// still starts rather than refusing to launch over a typo'd config value.
const FALLBACK_HOTKEY: rdev::Key = rdev::Key::F9;

fn init_logging() {
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", "info");
    env_logger::Builder::from_env(env).init();
}

fn main() -> ExitCode {
    init_logging();
    log::info!(
        "juno-dictation starting up (env={})",
        std::env::var("APP_ENV").unwrap_or_else(|_| "production".into())
    );

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.dictation.validate() {
        log::error!("configuration is invalid: {e}");
        return ExitCode::FAILURE;
    }
    log::info!(
        "configuration loaded (api key: {}, trigger word: {:?})",
        config.dictation.api_key_redacted(),
        config.dictation.ai_trigger_word
    );

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> ExitCode {
    let recorder = Arc::new(Recorder::new(
        config.audio.max_recording_secs,
        config.audio.ring_buffer_chunks,
    ));
    recorder.set_device(config.dictation.default_microphone.clone());

    let stt_provider = Arc::new(OpenAiSttProvider::new(
        config.dictation.openai_api_key.clone(),
        Duration::from_secs(config.runtime.transcription_timeout_secs),
    ));
    let transcription = Arc::new(TranscriptionOrchestrator::new(
        stt_provider,
        config.runtime.transcription_cache_capacity,
        Duration::from_secs(config.runtime.transcription_cache_ttl_secs),
    ));

    let llm_provider = Arc::new(OpenAiLlmProvider::new(
        config.dictation.openai_api_key.clone(),
        Duration::from_secs(config.runtime.ai_timeout_secs),
    ));
    let ai = Arc::new(AiCommandProcessor::new(llm_provider));

    let insertion = Arc::new(InsertionEngine::new());
    let selection = Arc::new(SelectionReader::default());
    let notifications = Arc::new(LogNotificationSink);

    let mut registry = Registry::new();
    registry.register(Arc::clone(&recorder));
    registry.register(Arc::clone(&transcription));
    registry.register(Arc::clone(&ai));
    registry.register(Arc::clone(&selection));
    registry.register(Arc::clone(&insertion));

    if let Err(e) = registry.initialize_all() {
        log::error!("initialization failed: {e}");
        return ExitCode::FAILURE;
    }

    let controller = Arc::new(PipelineController::new(
        recorder,
        transcription,
        ai,
        insertion,
        selection,
        notifications,
        config.dictation.clone(),
    ));

    let (hotkey_tx, hotkey_rx) = mpsc::channel(16);
    let key = parse_key(&config.dictation.keyboard_shortcut).unwrap_or_else(|| {
        log::warn!(
            "unrecognized keyboard_shortcut {:?}, falling back to F9",
            config.dictation.keyboard_shortcut
        );
        FALLBACK_HOTKEY
    });
    let _hotkey_listener = HotkeyListener::start(key, hotkey_tx);

    let controller_task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.run(hotkey_rx).await })
    };

    log::info!("ready — listening for {:?}", config.dictation.keyboard_shortcut);

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to install ctrl-c handler: {e}");
    }
    log::info!("shutdown signal received");

    controller_task.abort();
    registry.shutdown_all();
    ExitCode::SUCCESS
}
