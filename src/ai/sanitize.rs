//! Response sanitation (§4.5): trim, strip a code fence that wraps the
//! *entire* response (preserving inner fenced blocks), and collapse runs of
//! blank lines to at most one. Pure function, no teacher analog — modeled
//! on the plain-function style of `audio::resample`.

/// Sanitizes a raw LLM response per §4.5. Order matters: trim first so a
/// trailing newline after a closing fence doesn't defeat the "wraps the
/// entire response" check, then strip an enclosing fence, then collapse
/// blank-line runs.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = strip_enclosing_fence(trimmed);
    collapse_blank_lines(unfenced.trim())
}

/// Strips a code fence only when it encloses the *entire* response — i.e.
/// the first line is a fence opener and the last line is a bare fence
/// closer. A fence that only wraps part of the response (leaving other
/// content outside it) is left untouched, and so is any fence nested
/// inside the outer one.
fn strip_enclosing_fence(text: &str) -> &str {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return text;
    };
    if !first.trim_start().starts_with("```") {
        return text;
    }

    let all_lines: Vec<&str> = text.lines().collect();
    let Some(last) = all_lines.last() else {
        return text;
    };
    if last.trim() != "```" || all_lines.len() < 2 {
        return text;
    }

    let inner = &all_lines[1..all_lines.len() - 1];
    let start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let end = start + inner.join("\n").len();
    &text[start..end]
}

/// Collapses any run of two or more consecutive blank lines down to one.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_blank = false;
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        prev_blank = blank;
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize("  hello world  \n"), "hello world");
    }

    #[test]
    fn strips_enclosing_fence() {
        let raw = "```\nfn main() {}\n```";
        assert_eq!(sanitize(raw), "fn main() {}");
    }

    #[test]
    fn strips_enclosing_fence_with_language_tag() {
        let raw = "```rust\nfn main() {}\n```";
        assert_eq!(sanitize(raw), "fn main() {}");
    }

    #[test]
    fn preserves_inner_fenced_blocks() {
        let raw = "Here is an example:\n```rust\nfn main() {}\n```\nThat's it.";
        let out = sanitize(raw);
        assert!(out.contains("```rust"));
        assert!(out.contains("fn main() {}"));
        assert!(out.starts_with("Here is an example:"));
    }

    #[test]
    fn collapses_multiple_blank_lines_to_one() {
        let raw = "line one\n\n\n\nline two";
        assert_eq!(sanitize(raw), "line one\n\nline two");
    }

    #[test]
    fn leaves_single_blank_lines_alone() {
        let raw = "line one\n\nline two";
        assert_eq!(sanitize(raw), "line one\n\nline two");
    }

    #[test]
    fn plain_text_is_unchanged_besides_trimming() {
        assert_eq!(sanitize("just plain text"), "just plain text");
    }
}
