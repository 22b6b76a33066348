//! System/user prompt construction for the AI Command Processor (§4.5).
//!
//! Replaces the teacher's bilingual Thai/English `llm::prompt::PromptBuilder`
//! (STT post-correction prompts) with the fixed command-rewrite preamble
//! this spec calls for: a role description, the user's configured rules,
//! an instruction never to echo the highlighted text verbatim, and —
//! when a selection is present — the `HIGHLIGHTED TEXT:` block format.

const SYSTEM_PREAMBLE: &str = "\
You are a voice-driven command assistant embedded in the user's desktop. \
The user has spoken a command while dictating; rewrite or generate text \
according to that command and return only the resulting text, with no \
preamble, explanation, or commentary. Never repeat the user's highlighted \
text verbatim in your response — paraphrase, transform, or replace it as \
the command requires.";

const ECHO_GUARD_SUFFIX: &str = "\
\n\nYour previous response repeated too much of the highlighted text \
verbatim. Rewrite your answer so it does not reproduce the highlighted \
text; paraphrase or transform it instead.";

/// Builds the `{role: "system", content: …}` message content.
///
/// `rules` are the user's configured `ai_rules` (§6), rendered as a bulleted
/// list directly under the fixed preamble.
pub fn build_system_prompt(rules: &[String]) -> String {
    if rules.is_empty() {
        return SYSTEM_PREAMBLE.to_string();
    }
    let mut out = String::from(SYSTEM_PREAMBLE);
    out.push_str("\n\nAdditional rules:\n");
    for rule in rules {
        out.push_str("- ");
        out.push_str(rule);
        out.push('\n');
    }
    out
}

/// Builds the `{role: "user", content: …}` message content (§4.5).
///
/// When `selection` is non-empty, the command is followed by a
/// `HIGHLIGHTED TEXT:` block; otherwise the user prompt is just the
/// command.
pub fn build_user_prompt(command: &str, selection: &str) -> String {
    if selection.is_empty() {
        command.to_string()
    } else {
        format!("{command}\n\nHIGHLIGHTED TEXT:\n\"\"\"{selection}\"\"\"")
    }
}

/// Appends the echo-guard's "forbid repeating the highlighted text"
/// sentence to a user prompt, for the single permitted retry (§4.5).
pub fn with_echo_guard_retry(user_prompt: &str) -> String {
    format!("{user_prompt}{ECHO_GUARD_SUFFIX}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_without_rules_is_just_the_preamble() {
        let prompt = build_system_prompt(&[]);
        assert_eq!(prompt, SYSTEM_PREAMBLE);
    }

    #[test]
    fn system_prompt_appends_bulleted_rules() {
        let rules = vec!["be concise".to_string(), "use active voice".to_string()];
        let prompt = build_system_prompt(&rules);
        assert!(prompt.contains("- be concise"));
        assert!(prompt.contains("- use active voice"));
        assert!(prompt.starts_with(SYSTEM_PREAMBLE));
    }

    #[test]
    fn user_prompt_without_selection_is_the_command() {
        let prompt = build_user_prompt("write a haiku about the sea", "");
        assert_eq!(prompt, "write a haiku about the sea");
    }

    #[test]
    fn user_prompt_with_selection_wraps_it() {
        let prompt = build_user_prompt("explain this", "the function f computes factorial");
        assert!(prompt.starts_with("explain this\n\nHIGHLIGHTED TEXT:\n\"\"\""));
        assert!(prompt.ends_with("\"\"\""));
        assert!(prompt.contains("the function f computes factorial"));
    }

    #[test]
    fn echo_guard_retry_appends_forbidding_sentence() {
        let base = build_user_prompt("rewrite this", "some selected text");
        let retried = with_echo_guard_retry(&base);
        assert!(retried.starts_with(&base));
        assert!(retried.contains("does not reproduce the highlighted text"));
    }
}
