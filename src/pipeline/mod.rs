//! Pipeline Controller module (C11) — wires the full hotkey → capture →
//! transcription → classification → AI processing → insertion →
//! notification flow described in §4.8.
//!
//! # Architecture
//!
//! ```text
//! HotkeyEvent (mpsc)
//!        │
//!        ▼
//! PipelineController::run()  ← async tokio task
//!        │
//!        ├─ PushToTalkPressed  → Recorder::start()       → Recording
//!        │
//!        └─ PushToTalkReleased
//!              │
//!              ├─ Recorder::stop() + vad::analyze_clip   → Finalizing
//!              ├─ TranscriptionOrchestrator::transcribe  → Transcribing
//!              ├─ SelectionReader::read + classify       → (route)
//!              ├─ AiCommandProcessor::process (if Command)→ Processing
//!              └─ InsertionEngine::insert                → Inserting
//!
//! Terminal states (Completed/Cancelled/Failed) report through
//! NotificationSink, at most once per utterance, then settle back to Idle.
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use juno_dictation::ai::{AiCommandProcessor, OpenAiLlmProvider};
//! use juno_dictation::config::DictationConfig;
//! use juno_dictation::insertion::InsertionEngine;
//! use juno_dictation::notify::LogNotificationSink;
//! use juno_dictation::pipeline::PipelineController;
//! use juno_dictation::recorder::Recorder;
//! use juno_dictation::selection::SelectionReader;
//! use juno_dictation::transcription::{OpenAiSttProvider, TranscriptionOrchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let recorder = Arc::new(Recorder::default());
//!     let transcription = Arc::new(TranscriptionOrchestrator::new(
//!         Arc::new(OpenAiSttProvider::new(String::new(), Duration::from_secs(10))),
//!         500,
//!         Duration::from_secs(3600),
//!     ));
//!     let ai = Arc::new(AiCommandProcessor::new(Arc::new(OpenAiLlmProvider::new(
//!         String::new(),
//!         Duration::from_secs(5),
//!     ))));
//!     let insertion = Arc::new(InsertionEngine::new());
//!     let selection = Arc::new(SelectionReader::default());
//!
//!     let controller = Arc::new(PipelineController::new(
//!         recorder,
//!         transcription,
//!         ai,
//!         insertion,
//!         selection,
//!         Arc::new(LogNotificationSink),
//!         DictationConfig::default(),
//!     ));
//!
//!     let (_hotkey_tx, hotkey_rx) = mpsc::channel(16);
//!     tokio::spawn(async move { controller.run(hotkey_rx).await });
//!     // _hotkey_tx is passed to HotkeyListener::start(...)
//! }
//! ```

pub mod controller;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{AudioFeedback, ForegroundApp, NoopAudioFeedback, PipelineController, UnknownForegroundApp};
pub use state::{FailureKind, PipelineState};
