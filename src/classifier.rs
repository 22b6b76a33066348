//! Command Classifier — decides whether an utterance should be routed to
//! the AI Command Processor or inserted as plain dictation.
//!
//! Modeled as a pure, stateless `classify` function over a static scoring
//! table, in the style of the teacher's `llm::domain::DomainDetector` (a
//! keyword table scanned with `.filter().count()`); here the table scores
//! trigger-word, action-verb, deictic, and question-pattern signals instead
//! of medical/legal/technical/casual keyword buckets.

use crate::model::{ClassifierContext, ClassifierDecision, CommandClassification};

const GREETINGS: &[&str] = &["hey", "hi", "hello", "yo", "ok", "okay", "um", "uh"];
const DEICTICS: &[&str] = &["this", "that", "these", "the", "my"];
const INTENT_PHRASES: &[&str] = &["for me", "i want", "i need", "help me"];
const QUESTION_OPENERS: &[&str] = &["can", "could", "will", "would"];
const QUESTION_SUBJECTS: &[&str] = &["you", "i"];

const COMMAND_THRESHOLD: u8 = 60;
const CONFIRMATION_THRESHOLD: u8 = 40;

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|tok| {
            tok.trim_matches(|c: char| !c.is_alphanumeric() && c != ':')
                .to_lowercase()
        })
        .filter(|tok| !tok.is_empty())
        .collect()
}

/// Classifies a normalized utterance against the configured trigger word
/// and action verbs. Pure and deterministic — the same inputs always yield
/// the same [`CommandClassification`].
pub fn classify(
    text: &str,
    trigger_word: &str,
    action_verbs: &[String],
    action_verbs_enabled: bool,
    ctx: &ClassifierContext,
) -> CommandClassification {
    let trigger = trigger_word.to_lowercase();
    let lower = text.to_lowercase();
    let tokens = tokenize(&lower);

    if tokens.is_empty() {
        return CommandClassification {
            confidence: 0,
            detected_trigger: None,
            detected_verb: None,
            decision: ClassifierDecision::NotCommand,
        };
    }

    // Explicit prefixes and trigger-word openers short-circuit to 100.
    if lower.starts_with("ai:") || lower.starts_with("command:") {
        return CommandClassification {
            confidence: 100,
            detected_trigger: Some(trigger),
            detected_verb: None,
            decision: ClassifierDecision::Command,
        };
    }

    if tokens[0] == trigger {
        return CommandClassification {
            confidence: 100,
            detected_trigger: Some(trigger),
            detected_verb: None,
            decision: ClassifierDecision::Command,
        };
    }

    if tokens.len() >= 2 && GREETINGS.contains(&tokens[0].as_str()) && tokens[1] == trigger {
        return CommandClassification {
            confidence: 100,
            detected_trigger: Some(trigger),
            detected_verb: None,
            decision: ClassifierDecision::Command,
        };
    }

    if tokens.len() >= 3
        && GREETINGS.contains(&tokens[0].as_str())
        && GREETINGS.contains(&tokens[1].as_str())
        && tokens[2] == trigger
    {
        return CommandClassification {
            confidence: 100,
            detected_trigger: Some(trigger),
            detected_verb: None,
            decision: ClassifierDecision::Command,
        };
    }

    let mut score: i32 = 0;
    let mut detected_verb = None;

    if action_verbs_enabled {
        let verb_pos = tokens
            .iter()
            .take(3)
            .position(|tok| action_verbs.iter().any(|v| v == tok));

        if let Some(pos) = verb_pos {
            let verb = tokens[pos].clone();

            let is_question = tokens
                .iter()
                .take(5)
                .position(|tok| QUESTION_OPENERS.contains(&tok.as_str()))
                .map(|opener_pos| {
                    tokens
                        .iter()
                        .skip(opener_pos + 1)
                        .take(4)
                        .any(|tok| QUESTION_SUBJECTS.contains(&tok.as_str()))
                        && tokens.iter().take(5).any(|tok| tok == &verb)
                })
                .unwrap_or(false);

            if is_question {
                score += 40;
            } else {
                score += 30;
            }

            let has_deictic = tokens
                .get(pos + 1)
                .is_some_and(|next| DEICTICS.contains(&next.as_str()));
            if has_deictic {
                score += if is_question { 15 } else { 20 };
            }

            detected_verb = Some(verb);
        }
    }

    if INTENT_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        score += 15;
    }

    if ctx.has_highlighted_text {
        score += 20;
    }
    if ctx.is_long_dictation {
        score -= 25;
    }
    if ctx.recent_ai_commands > 0 {
        score += 10;
    }

    let confidence = score.clamp(0, 100) as u8;

    let decision = if confidence >= COMMAND_THRESHOLD {
        ClassifierDecision::Command
    } else if confidence >= CONFIRMATION_THRESHOLD {
        ClassifierDecision::NeedsConfirmation
    } else {
        ClassifierDecision::NotCommand
    };

    CommandClassification {
        confidence,
        detected_trigger: None,
        detected_verb,
        decision,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn verbs() -> Vec<String> {
        crate::config::DEFAULT_ACTION_VERBS.iter().map(|s| s.to_string()).collect()
    }

    fn ctx() -> ClassifierContext {
        ClassifierContext::default()
    }

    #[test]
    fn first_word_trigger_scores_100() {
        let out = classify("juno summarize this", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 100);
        assert_eq!(out.decision, ClassifierDecision::Command);
        assert_eq!(out.detected_trigger.as_deref(), Some("juno"));
    }

    #[test]
    fn greeting_trigger_scores_100() {
        let out = classify("hey juno fix this", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 100);
    }

    #[test]
    fn double_greeting_trigger_scores_100() {
        let out = classify("um uh juno explain this", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 100);
    }

    #[test]
    fn explicit_prefix_scores_100() {
        let out = classify("ai: rewrite this paragraph", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 100);
        let out2 = classify("command: fix grammar", "juno", &verbs(), true, &ctx());
        assert_eq!(out2.confidence, 100);
    }

    #[test]
    fn verb_in_first_three_tokens_adds_30() {
        let out = classify("please summarize stuff", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 30);
        assert_eq!(out.detected_verb.as_deref(), Some("summarize"));
    }

    #[test]
    fn verb_followed_by_deictic_adds_20_more() {
        let out = classify("summarize this please", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 50);
        assert_eq!(out.decision, ClassifierDecision::NeedsConfirmation);
    }

    #[test]
    fn question_pattern_scores_40_plus_deictic_bonus() {
        let out = classify("can you fix this", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 55);
    }

    #[test]
    fn intent_phrase_adds_15_once() {
        let out = classify("fix this for me please for me", "juno", &verbs(), true, &ctx());
        // verb(30) + deictic(20) + intent phrase once(15) = 65
        assert_eq!(out.confidence, 65);
        assert_eq!(out.decision, ClassifierDecision::Command);
    }

    #[test]
    fn highlighted_text_adds_20() {
        let mut context = ctx();
        context.has_highlighted_text = true;
        let out = classify("summarize", "juno", &verbs(), true, &context);
        assert_eq!(out.confidence, 50);
    }

    #[test]
    fn long_dictation_subtracts_25_and_floors_at_zero() {
        let mut context = ctx();
        context.is_long_dictation = true;
        let out = classify("hello there", "juno", &verbs(), true, &context);
        assert_eq!(out.confidence, 0);
    }

    #[test]
    fn recent_ai_commands_adds_10() {
        let mut context = ctx();
        context.recent_ai_commands = 2;
        let out = classify("summarize", "juno", &verbs(), true, &context);
        assert_eq!(out.confidence, 40);
        assert_eq!(out.decision, ClassifierDecision::NeedsConfirmation);
    }

    #[test]
    fn disabled_verb_detection_ignores_verb_signals_but_not_trigger() {
        let out = classify("summarize this now", "juno", &verbs(), false, &ctx());
        assert_eq!(out.confidence, 0);
        assert!(out.detected_verb.is_none());

        let triggered = classify("juno summarize this", "juno", &verbs(), false, &ctx());
        assert_eq!(triggered.confidence, 100);
    }

    #[test]
    fn plain_dictation_scores_zero() {
        let out = classify("the weather today is lovely", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 0);
        assert_eq!(out.decision, ClassifierDecision::NotCommand);
    }

    #[test]
    fn empty_text_is_not_a_command() {
        let out = classify("   ", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 0);
        assert_eq!(out.decision, ClassifierDecision::NotCommand);
    }

    #[test]
    fn boundary_exactly_60_is_command() {
        // verb(30) + deictic(20) + recent_ai_commands(10) = 60
        let mut context = ctx();
        context.recent_ai_commands = 1;
        let out = classify("summarize this", "juno", &verbs(), true, &context);
        assert_eq!(out.confidence, 60);
        assert_eq!(out.decision, ClassifierDecision::Command);
    }

    #[test]
    fn boundary_exactly_40_needs_confirmation() {
        let mut context = ctx();
        context.recent_ai_commands = 1;
        let out = classify("summarize", "juno", &verbs(), true, &context);
        assert_eq!(out.confidence, 40);
        assert_eq!(out.decision, ClassifierDecision::NeedsConfirmation);
    }

    #[test]
    fn boundary_just_below_40_is_not_command() {
        let out = classify("summarize", "juno", &verbs(), true, &ctx());
        assert_eq!(out.confidence, 30);
        assert_eq!(out.decision, ClassifierDecision::NotCommand);
    }
}
