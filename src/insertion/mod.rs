//! Text Insertion Engine — places text at the user's cursor in the
//! foreground application, preferring native paste semantics (§4.6).
//!
//! Renamed and generalized from the teacher's `inject/` module: the fixed
//! single-path clipboard-paste sequence becomes an ordered fallback chain
//! ([`engine::InsertionEngine`]) of four strategies, each tried in turn.

pub mod clipboard;
pub mod engine;
pub mod keyboard;

pub use clipboard::{restore_clipboard, save_clipboard, set_clipboard};
pub use engine::{InsertionEngine, InsertionResult};
pub use keyboard::{simulate_copy, simulate_paste};

use thiserror::Error;

/// Errors surfaced by the clipboard and keyboard primitives. The engine
/// itself never propagates these upward past a single attempt — see
/// [`engine::InsertionEngine::insert`].
#[derive(Debug, Error)]
pub enum InsertionError {
    #[error("cannot access clipboard: {0}")]
    ClipboardAccess(String),
    #[error("cannot set clipboard text: {0}")]
    ClipboardSet(String),
    #[error("cannot simulate key press: {0}")]
    KeySimulation(String),
}
