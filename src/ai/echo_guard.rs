//! Echo-guard — detects when the AI's response merely repeats the
//! highlighted text back at the user instead of transforming it (§4.5).
//!
//! Only engages for selections longer than 100 characters. Tokenizes both
//! the selection and the response on whitespace, keeps selection tokens
//! longer than 3 characters, and counts how many appear (case-folded,
//! substring match) anywhere in the response. A fraction over the
//! configured threshold means the response is mostly the selection
//! restated — the caller should retry once with [`super::prompt::with_echo_guard_retry`].

/// The similarity fraction above which a response is considered an echo of
/// the selection (§4.5, §9: "treat the 0.70 constant as a tunable").
pub const ECHO_THRESHOLD: f64 = 0.70;
/// The echo-guard only activates for selections at or above this length.
pub const MIN_SELECTION_LEN: usize = 100;

/// Returns `true` when `response` echoes `selection` above [`ECHO_THRESHOLD`].
/// Selections shorter than [`MIN_SELECTION_LEN`] never trigger the guard.
pub fn is_echo(selection: &str, response: &str) -> bool {
    if selection.chars().count() <= MIN_SELECTION_LEN {
        return false;
    }
    similarity(selection, response) > ECHO_THRESHOLD
}

/// The raw similarity fraction, exposed for tests and diagnostics.
fn similarity(selection: &str, response: &str) -> f64 {
    let response_lower = response.to_lowercase();
    let qualifying: Vec<&str> = selection
        .split_whitespace()
        .filter(|tok| tok.chars().count() > 3)
        .collect();

    if qualifying.is_empty() {
        return 0.0;
    }

    let matched = qualifying
        .iter()
        .filter(|tok| response_lower.contains(&tok.to_lowercase()))
        .count();

    matched as f64 / qualifying.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn long_selection() -> String {
        "the function computes the factorial recursively using a helper accumulator \
         parameter so the compiler can apply tail call optimization during execution"
            .to_string()
    }

    #[test]
    fn short_selection_never_triggers_guard() {
        assert!(!is_echo("short text here", "short text here"));
    }

    #[test]
    fn verbatim_echo_of_long_selection_triggers_guard() {
        let selection = long_selection();
        assert!(is_echo(&selection, &selection));
    }

    #[test]
    fn transformed_response_does_not_trigger_guard() {
        let selection = long_selection();
        let response = "this code uses recursion with memoization for efficiency";
        assert!(!is_echo(&selection, response));
    }

    #[test]
    fn case_folded_substring_match_counts() {
        let selection = long_selection();
        let response = selection.to_uppercase();
        assert!(is_echo(&selection, &response));
    }

    #[test]
    fn short_tokens_are_excluded_from_scoring() {
        // All qualifying (>3 char) tokens are absent; only short filler words match.
        let selection = "the big red dog ran far and the cat sat";
        let response = "a tiny pup did not move at all";
        assert!(!is_echo(selection, response));
    }

    #[test]
    fn threshold_boundary_just_above_fires() {
        // 8 qualifying tokens (>3 chars), 6 present in response => 0.75 > 0.70.
        // Padded with short filler words (<=3 chars, excluded from scoring)
        // so the selection clears the 100-character activation floor.
        let selection = "alpha bravo charlie delta echo foxtrot golf hotel and the a an it is to in on at for you if we got it now too so far yes no ok";
        let response = "alpha bravo charlie delta echo foxtrot nothing nothing";
        assert!(selection.chars().count() > MIN_SELECTION_LEN);
        assert!(is_echo(selection, response));
    }
}
