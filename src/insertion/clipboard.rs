//! Clipboard save / restore helpers backed by the `arboard` crate.
//!
//! All three functions create a short-lived [`arboard::Clipboard`] handle
//! rather than sharing one across calls, because `arboard::Clipboard` is not
//! `Send` on all platforms and the handle is cheap to create. Shared by the
//! Text Insertion Engine (`engine.rs`) and the Selection Reader's
//! clipboard-roundtrip strategy.

use arboard::Clipboard;

use super::InsertionError;

/// Capture the current clipboard plain-text content.
///
/// Returns `Ok(None)` when the clipboard is empty or holds non-text data
/// (e.g. an image) — never an error just because nothing was copied yet.
pub fn save_clipboard() -> Result<Option<String>, InsertionError> {
    let mut clipboard = open_clipboard()?;
    Ok(clipboard.get_text().ok())
}

/// Write `text` into the system clipboard, replacing whatever was there.
pub fn set_clipboard(text: &str) -> Result<(), InsertionError> {
    let mut clipboard = open_clipboard()?;
    clipboard
        .set_text(text)
        .map_err(|e| InsertionError::ClipboardSet(e.to_string()))
}

/// Restore the clipboard to a previously saved value. `None` means nothing
/// was saved (the clipboard was empty or non-text beforehand); this is a
/// no-op rather than an error.
pub fn restore_clipboard(saved: Option<String>) -> Result<(), InsertionError> {
    match saved {
        Some(text) => set_clipboard(&text),
        None => Ok(()),
    }
}

fn open_clipboard() -> Result<Clipboard, InsertionError> {
    Clipboard::new().map_err(|e| InsertionError::ClipboardAccess(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restoring_none_is_a_noop() {
        assert!(restore_clipboard(None).is_ok());
    }
}
