//! AI Command Processor (C9) — rewrites a command utterance through a
//! remote LLM, using the current foreground selection as context (§4.5).
//!
//! Four small modules mirror the algorithm's stages: [`prompt`] builds the
//! system/user messages, [`provider`] makes the actual HTTP call,
//! [`echo_guard`] decides whether the response merely restates the
//! selection, and [`sanitize`] cleans up whatever response is kept.
//! [`processor::AiCommandProcessor`] is the seam the Pipeline Controller
//! drives.

pub mod echo_guard;
pub mod processor;
pub mod prompt;
pub mod provider;
pub mod sanitize;

pub use processor::{AiCommandProcessor, ProcessOutcome};
pub use provider::{AiError, LlmProvider, OpenAiLlmProvider};
