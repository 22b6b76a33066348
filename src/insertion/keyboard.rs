//! Keyboard simulation helpers backed by the `enigo` crate.
//!
//! | Platform | Paste / Copy shortcut |
//! |----------|------------------------|
//! | macOS    | ⌘V / ⌘C (Meta + V/C) |
//! | Windows / Linux | Ctrl+V / Ctrl+C |

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::InsertionError;

/// A code point the [`KeySimulation`](super::engine::InsertionStrategyKind)
/// strategy refuses to type directly because it requires IME composition
/// (CJK, combining marks) rather than a single keystroke.
pub fn requires_composition(c: char) -> bool {
    let cp = c as u32;
    matches!(cp,
        0x0300..=0x036F // combining diacritical marks
        | 0x0E00..=0x0E7F // Thai
        | 0x3040..=0x30FF // Hiragana/Katakana
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xAC00..=0xD7A3 // Hangul syllables
    )
}

fn open_enigo() -> Result<Enigo, InsertionError> {
    Enigo::new(&Settings::default()).map_err(|e| InsertionError::KeySimulation(e.to_string()))
}

fn modifier_key() -> Key {
    #[cfg(target_os = "macos")]
    {
        Key::Meta
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}

fn chord(letter: char) -> Result<(), InsertionError> {
    let mut enigo = open_enigo()?;
    let modifier = modifier_key();
    enigo
        .key(modifier, Direction::Press)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))?;
    enigo
        .key(Key::Unicode(letter), Direction::Click)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))?;
    enigo
        .key(modifier, Direction::Release)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))
}

/// Simulate the system paste shortcut in the currently focused window.
pub fn simulate_paste() -> Result<(), InsertionError> {
    chord('v')
}

/// Simulate the system copy shortcut — used by the Selection Reader's
/// clipboard-roundtrip strategy.
pub fn simulate_copy() -> Result<(), InsertionError> {
    chord('c')
}

/// Synthesize a single "delete" keystroke (used before KeySimulation when
/// replacing an existing selection in apps that preserve the selection
/// across synthesized keypresses).
pub fn simulate_delete() -> Result<(), InsertionError> {
    let mut enigo = open_enigo()?;
    enigo
        .key(Key::Backspace, Direction::Click)
        .map_err(|e| InsertionError::KeySimulation(e.to_string()))
}

/// Type `text` one code point at a time. Callers must have already checked
/// [`requires_composition`] is false for every character and that the text
/// is short enough (§4.6's 500 code-point ceiling) before calling this.
pub fn simulate_keystrokes(text: &str) -> Result<(), InsertionError> {
    let mut enigo = open_enigo()?;
    for ch in text.chars() {
        enigo
            .key(Key::Unicode(ch), Direction::Click)
            .map_err(|e| InsertionError::KeySimulation(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_never_requires_composition() {
        assert!(!requires_composition('a'));
        assert!(!requires_composition('Z'));
        assert!(!requires_composition(' '));
    }

    #[test]
    fn cjk_requires_composition() {
        assert!(requires_composition('日'));
        assert!(requires_composition('한'));
    }

    #[test]
    fn combining_marks_require_composition() {
        assert!(requires_composition('\u{0301}'));
    }
}
