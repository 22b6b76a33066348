//! Transcription Orchestrator (C8) — converts a finished [`crate::model::AudioClip`]
//! to text through a remote speech-to-text provider, with caching and
//! supersede-cancellation (§4.4).
//!
//! Four small modules mirror the algorithm's stages: [`provider`] makes the
//! actual HTTP call, [`cache`] holds recent results keyed by [`fingerprint`],
//! and [`orchestrator::TranscriptionOrchestrator`] is the seam the Pipeline
//! Controller drives.

pub mod cache;
pub mod fingerprint;
pub mod orchestrator;
pub mod provider;

pub use orchestrator::TranscriptionOrchestrator;
pub use provider::{OpenAiSttProvider, SttProvider, TranscriptionError};
