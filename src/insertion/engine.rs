//! Text Insertion Engine — places text at the cursor in the foreground
//! application, falling back through an ordered chain of strategies.
//!
//! Generalizes the teacher's `inject::TextInjector` (a single fixed
//! save → set → paste → restore sequence) into the four-strategy fallback
//! chain in §4.6: `PrimaryPaste` → `SecondaryPaste` → `KeySimulation` →
//! `ClipboardFallback`, each attempt logged to an [`InsertionAttempt`] and
//! retried up to twice with a linear backoff before the engine advances to
//! the next strategy.
//!
//! A full-chain failure is never reported upward as an error: the text
//! always ends up on the clipboard and the caller sees
//! [`InsertionResult::Deferred`], matching §4.6/§7's "insertion never fails
//! upward" contract.

use std::thread;
use std::time::{Duration, Instant};

use crate::model::{InsertionAttempt, InsertionOutcome, InsertionStrategyKind, Selection};
use crate::registry::Service;

use super::clipboard::{restore_clipboard, save_clipboard, set_clipboard};
use super::keyboard::{requires_composition, simulate_delete, simulate_keystrokes, simulate_paste};
use super::InsertionError;

/// Maximum code points [`InsertionStrategyKind::KeySimulation`] will type
/// directly (§4.6).
pub const KEY_SIMULATION_MAX_CHARS: usize = 500;
/// Attempts per strategy before advancing to the next one (§4.6).
pub const MAX_ATTEMPTS_PER_STRATEGY: u32 = 2;
/// Linear backoff between same-strategy attempts (§4.6, §5).
pub const RETRY_BACKOFF: Duration = Duration::from_millis(300);

/// The terminal outcome of an insertion job. Never an error — see module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionResult {
    /// Text was placed at the cursor by the named strategy.
    Inserted(InsertionStrategyKind),
    /// Every active-insertion strategy failed; the text is on the clipboard
    /// and the caller must notify the user to paste manually.
    Deferred,
}

/// A set of quirks the engine consults when deciding whether it's safe to
/// issue a leading delete keystroke ahead of [`InsertionStrategyKind::KeySimulation`].
/// The spec reserves this for apps "known to preserve selection on
/// synthesized keypresses" (§4.6) — conservatively empty by default since
/// this daemon has no per-app integration testing to back a wider list.
pub trait AppQuirks: Send + Sync {
    fn preserves_selection_on_keypress(&self, app_name: &str) -> bool {
        let _ = app_name;
        false
    }
}

#[derive(Default)]
pub struct DefaultAppQuirks;
impl AppQuirks for DefaultAppQuirks {}

/// Drives the PrimaryPaste → SecondaryPaste → KeySimulation →
/// ClipboardFallback fallback chain.
pub struct InsertionEngine {
    quirks: Box<dyn AppQuirks>,
}

impl Default for InsertionEngine {
    fn default() -> Self {
        Self {
            quirks: Box::new(DefaultAppQuirks),
        }
    }
}

impl InsertionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quirks(quirks: Box<dyn AppQuirks>) -> Self {
        Self { quirks }
    }

    /// Runs the fallback chain for `text`, treating the job as a
    /// *replacement* when `selection` is non-empty (§4.6). Returns the
    /// terminal result plus the ordered log of every attempt made.
    pub fn insert(
        &self,
        text: &str,
        selection: &Selection,
        app_name: &str,
    ) -> (InsertionResult, Vec<InsertionAttempt>) {
        let mut attempts = Vec::new();

        if self.run_strategy(InsertionStrategyKind::PrimaryPaste, text, selection, app_name, &mut attempts) {
            return (InsertionResult::Inserted(InsertionStrategyKind::PrimaryPaste), attempts);
        }
        if self.run_strategy(InsertionStrategyKind::SecondaryPaste, text, selection, app_name, &mut attempts) {
            return (InsertionResult::Inserted(InsertionStrategyKind::SecondaryPaste), attempts);
        }
        if key_simulation_applicable(text)
            && self.run_strategy(InsertionStrategyKind::KeySimulation, text, selection, app_name, &mut attempts)
        {
            return (InsertionResult::Inserted(InsertionStrategyKind::KeySimulation), attempts);
        }
        if self.run_strategy(InsertionStrategyKind::ClipboardFallback, text, selection, app_name, &mut attempts) {
            return (InsertionResult::Inserted(InsertionStrategyKind::ClipboardFallback), attempts);
        }

        // Every strategy, including ClipboardFallback's own write, failed.
        // The text is still handed to the caller as deferred; the clipboard
        // may not hold it only in the pathological case where the OS
        // clipboard itself is unreachable.
        (InsertionResult::Deferred, attempts)
    }

    fn run_strategy(
        &self,
        strategy: InsertionStrategyKind,
        text: &str,
        selection: &Selection,
        app_name: &str,
        attempts: &mut Vec<InsertionAttempt>,
    ) -> bool {
        for attempt_no in 1..=MAX_ATTEMPTS_PER_STRATEGY {
            let started_at = Instant::now();
            let outcome = self.try_once(strategy, text, selection, app_name);
            let succeeded = matches!(outcome, InsertionOutcome::Success);
            attempts.push(InsertionAttempt {
                strategy,
                started_at,
                outcome,
            });
            if succeeded {
                return true;
            }
            if attempt_no < MAX_ATTEMPTS_PER_STRATEGY {
                thread::sleep(RETRY_BACKOFF);
            }
        }
        false
    }

    fn try_once(
        &self,
        strategy: InsertionStrategyKind,
        text: &str,
        selection: &Selection,
        app_name: &str,
    ) -> InsertionOutcome {
        let result = match strategy {
            InsertionStrategyKind::PrimaryPaste => set_clipboard(text).and_then(|_| simulate_paste()),
            InsertionStrategyKind::SecondaryPaste => {
                set_clipboard(text).and_then(|_| simulate_secondary_paste())
            }
            InsertionStrategyKind::KeySimulation => {
                if !selection.is_empty() && self.quirks.preserves_selection_on_keypress(app_name) {
                    let _ = simulate_delete();
                }
                simulate_keystrokes(text)
            }
            InsertionStrategyKind::ClipboardFallback => clipboard_fallback(text),
        };

        match result {
            Ok(()) => InsertionOutcome::Success,
            Err(e) => InsertionOutcome::Failure(e.to_string()),
        }
    }
}

impl Service for InsertionEngine {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn key_simulation_applicable(text: &str) -> bool {
    text.chars().count() <= KEY_SIMULATION_MAX_CHARS && !text.chars().any(requires_composition)
}

/// The platform-alternative paste path (§4.6: "a second OS automation
/// surface"). No second distinct OS automation crate is in this daemon's
/// dependency stack, so this is modeled as a Shift+Insert chord — a
/// genuinely different key combination from PrimaryPaste's Ctrl/Cmd+V,
/// honoring the "alternate path" intent without fabricating a platform API
/// this crate doesn't otherwise use.
fn simulate_secondary_paste() -> Result<(), InsertionError> {
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};
    let mut enigo = Enigo::new(&Settings::default())
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))?;
    enigo
        .key(Key::Shift, Direction::Press)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))?;
    enigo
        .key(Key::Insert, Direction::Click)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))?;
    enigo
        .key(Key::Shift, Direction::Release)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))
}

/// Writes `text` to the clipboard and leaves it there. If the write itself
/// fails, whatever was captured immediately beforehand is restored so the
/// clipboard isn't left in an undefined half-mutated state — this is the
/// only restore case the engine ever performs (§4.6's otherwise-ambiguous
/// "restore only for ClipboardFallback" note resolves to: only on this
/// attempt's own failure, not on the terminal success path).
fn clipboard_fallback(text: &str) -> Result<(), InsertionError> {
    let previous = save_clipboard().ok().flatten();
    match set_clipboard(text) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = restore_clipboard(previous);
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_simulation_rejects_long_text() {
        let long = "a".repeat(501);
        assert!(!key_simulation_applicable(&long));
        let short = "a".repeat(500);
        assert!(key_simulation_applicable(&short));
    }

    #[test]
    fn key_simulation_rejects_composed_characters() {
        assert!(!key_simulation_applicable("summary: 日本語"));
        assert!(key_simulation_applicable("summary: plain ascii"));
    }

    #[test]
    fn default_quirks_never_preserve_selection() {
        let quirks = DefaultAppQuirks;
        assert!(!quirks.preserves_selection_on_keypress("vscode"));
        assert!(!quirks.preserves_selection_on_keypress("notepad"));
    }
}
