//! Keyword and shape rules used when the model's answer cannot be parsed.
//!
//! Deliberately conservative and independent of any model output, so a
//! drifting response format never changes how the fallback decides.

/// Substrings that mark a question as unusable. Matched against the
/// lowercased, trimmed question.
pub const TRIGGER_PATTERNS: &[&str] = &[
    // thanks, greetings, test and placeholder tokens
    "thank",
    "thanks",
    "hello",
    "hi there",
    "test",
    "???",
    ".",
    "..",
    "...",
    // complaints about the picture instead of a question
    "this image",
    "can't see",
    "blurry",
    "not clear",
    "poor quality",
    "doesn't show",
    "does not show",
    // openers that depend on an earlier conversation
    "oh so",
    "so then",
    "but what",
    "what am i doing",
    "am i doing wrong",
    // external knowledge
    "where can i buy",
    "how many calories",
];

const MIN_CHARS: usize = 3;
const MAX_STATEMENT_TOKENS: usize = 5;

/// Returns the first trigger pattern contained in the question, if any.
pub fn matched_trigger(question: &str) -> Option<&'static str> {
    let lower = question.trim().to_lowercase();
    TRIGGER_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lower.contains(pattern))
}

fn is_too_short(question: &str) -> bool {
    question.trim().chars().count() < MIN_CHARS
}

fn looks_like_statement(question: &str) -> bool {
    !question.trim().ends_with('?') && question.split_whitespace().count() > MAX_STATEMENT_TOKENS
}

/// Fallback relevance decision over the question text alone.
pub fn heuristic_is_relevant(question: &str) -> bool {
    matched_trigger(question).is_none() && !is_too_short(question) && !looks_like_statement(question)
}
