//! Selection Reader — returns the foreground application's selected text,
//! or the empty string (§4.7).
//!
//! Strategies are an ordered sequence of implementations of
//! `{is_applicable, get_selection}`, matching the `InsertionStrategyKind`
//! fallback-chain idiom in `insertion::engine`. Grounded in
//! `insertion::clipboard`'s save/restore primitives, reused directly here
//! for the clipboard-roundtrip strategy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::insertion::clipboard::{restore_clipboard, save_clipboard, set_clipboard};
use crate::insertion::keyboard::simulate_copy;
use crate::model::Selection;
use crate::registry::Service;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("strategy not applicable to this application")]
    NotApplicable,
}

/// The outcome of one strategy's attempt to read the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRead {
    pub text: String,
    pub success: bool,
}

/// A single selection-reading strategy. Implementations must not leave the
/// clipboard in an observably different state once `get_selection` returns,
/// except for the brief window bracketed by an "internal operation" guard
/// (§4.7's invariant).
pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_applicable(&self, app_name: &str) -> bool;
    fn get_selection(&self, app_name: &str) -> Result<SelectionRead, SelectionError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SelectionStrategy>) {}
};

/// Asks focused own-process windows (if any) for their DOM/text selection.
/// This daemon is headless and owns no windows, so this strategy is never
/// applicable — it exists as the documented extension point a host
/// application with its own UI surface would fill in, preserving the
/// strategy-ordering the spec calls for.
pub struct InProcessStrategy;

impl SelectionStrategy for InProcessStrategy {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn is_applicable(&self, _app_name: &str) -> bool {
        false
    }

    fn get_selection(&self, _app_name: &str) -> Result<SelectionRead, SelectionError> {
        Err(SelectionError::NotApplicable)
    }
}

/// Marks an "internal clipboard operation" window, saves the current
/// clipboard, synthesizes a copy, reads the new clipboard, and restores the
/// previous value. A single retry with a 300 ms gap is permitted (§4.7).
pub struct ClipboardRoundtripStrategy {
    internal_operation: Arc<AtomicBool>,
    retry_gap: Duration,
}

impl ClipboardRoundtripStrategy {
    pub fn new() -> Self {
        Self {
            internal_operation: Arc::new(AtomicBool::new(false)),
            retry_gap: Duration::from_millis(300),
        }
    }

    /// Exposes the "internal operation" flag so other components (e.g. a
    /// clipboard-change watcher) can tell a selection read apart from a
    /// genuine user copy.
    pub fn internal_operation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.internal_operation)
    }

    fn attempt_once(&self) -> Result<SelectionRead, SelectionError> {
        self.internal_operation.store(true, Ordering::SeqCst);
        let result = (|| {
            let previous = save_clipboard().map_err(|e| SelectionError::Clipboard(e.to_string()))?;
            simulate_copy().map_err(|e| SelectionError::Clipboard(e.to_string()))?;
            // Give the target app a moment to populate the clipboard.
            thread::sleep(Duration::from_millis(50));
            let copied = save_clipboard().map_err(|e| SelectionError::Clipboard(e.to_string()))?;
            restore_clipboard(previous).map_err(|e| SelectionError::Clipboard(e.to_string()))?;

            let text = copied.unwrap_or_default();
            Ok(SelectionRead {
                success: !text.is_empty(),
                text,
            })
        })();
        self.internal_operation.store(false, Ordering::SeqCst);
        result
    }
}

impl Default for ClipboardRoundtripStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStrategy for ClipboardRoundtripStrategy {
    fn name(&self) -> &'static str {
        "clipboard-roundtrip"
    }

    fn is_applicable(&self, _app_name: &str) -> bool {
        true
    }

    fn get_selection(&self, _app_name: &str) -> Result<SelectionRead, SelectionError> {
        match self.attempt_once() {
            Ok(read) if read.success => Ok(read),
            Ok(_) => {
                thread::sleep(self.retry_gap);
                self.attempt_once()
            }
            Err(_) => {
                thread::sleep(self.retry_gap);
                self.attempt_once()
            }
        }
    }
}

/// Picks the first applicable strategy and returns its selection; on
/// failure or an empty result, continues to the next. Returns
/// [`Selection::empty`] when every strategy is exhausted.
pub struct SelectionReader {
    strategies: Vec<Box<dyn SelectionStrategy>>,
}

impl SelectionReader {
    pub fn new(strategies: Vec<Box<dyn SelectionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn read(&self, app_name: &str) -> Selection {
        for strategy in &self.strategies {
            if !strategy.is_applicable(app_name) {
                continue;
            }
            match strategy.get_selection(app_name) {
                Ok(read) if read.success && !read.text.is_empty() => {
                    return Selection {
                        text: read.text,
                        source_application_name: app_name.to_string(),
                    };
                }
                _ => continue,
            }
        }
        Selection {
            text: String::new(),
            source_application_name: app_name.to_string(),
        }
    }
}

impl Default for SelectionReader {
    fn default() -> Self {
        Self::new(vec![
            Box::new(InProcessStrategy),
            Box::new(ClipboardRoundtripStrategy::new()),
        ])
    }
}

impl Service for SelectionReader {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysText(&'static str);
    impl SelectionStrategy for AlwaysText {
        fn name(&self) -> &'static str {
            "always-text"
        }
        fn is_applicable(&self, _app_name: &str) -> bool {
            true
        }
        fn get_selection(&self, _app_name: &str) -> Result<SelectionRead, SelectionError> {
            Ok(SelectionRead {
                text: self.0.to_string(),
                success: true,
            })
        }
    }

    struct NeverApplicable;
    impl SelectionStrategy for NeverApplicable {
        fn name(&self) -> &'static str {
            "never"
        }
        fn is_applicable(&self, _app_name: &str) -> bool {
            false
        }
        fn get_selection(&self, _app_name: &str) -> Result<SelectionRead, SelectionError> {
            unreachable!("must not be called when not applicable")
        }
    }

    struct AlwaysEmpty;
    impl SelectionStrategy for AlwaysEmpty {
        fn name(&self) -> &'static str {
            "empty"
        }
        fn is_applicable(&self, _app_name: &str) -> bool {
            true
        }
        fn get_selection(&self, _app_name: &str) -> Result<SelectionRead, SelectionError> {
            Ok(SelectionRead {
                text: String::new(),
                success: false,
            })
        }
    }

    #[test]
    fn skips_inapplicable_strategies() {
        let reader = SelectionReader::new(vec![Box::new(NeverApplicable), Box::new(AlwaysText("hi"))]);
        let selection = reader.read("editor");
        assert_eq!(selection.text, "hi");
    }

    #[test]
    fn falls_through_empty_results() {
        let reader = SelectionReader::new(vec![Box::new(AlwaysEmpty), Box::new(AlwaysText("found"))]);
        let selection = reader.read("editor");
        assert_eq!(selection.text, "found");
    }

    #[test]
    fn exhausting_all_strategies_yields_empty_selection() {
        let reader = SelectionReader::new(vec![Box::new(AlwaysEmpty), Box::new(NeverApplicable)]);
        let selection = reader.read("editor");
        assert!(selection.is_empty());
    }

    #[test]
    fn in_process_strategy_is_never_applicable_headless() {
        let strategy = InProcessStrategy;
        assert!(!strategy.is_applicable("any-app"));
    }

    #[test]
    fn internal_operation_flag_resets_after_use() {
        let strategy = ClipboardRoundtripStrategy::new();
        let flag = strategy.internal_operation_flag();
        assert!(!flag.load(Ordering::SeqCst));
    }
}
