//! Question relevance classification.
//!
//! The model sees only the question text, never the image, so the label
//! reflects whether the text itself is a well-formed, standalone, answerable
//! question. Responses that cannot be parsed fall back to [`crate::heuristic`].

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PromptConfig;
use crate::heuristic::heuristic_is_relevant;
use crate::llm::TextModel;
use crate::model::{RelevanceVerdict, VerdictMethod};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You review questions that blind and low-vision users \
asked about photos they took. Answer exactly in the format requested.";

pub const DEFAULT_RELEVANCE_PROMPT: &str = r#"Decide whether the question below is useful for training or evaluating a vision-language model.

Only the question text is shown to you. The image is withheld on purpose.

The question is NOT relevant when it:
- only thanks or greets someone ("Thanks", "Thank you for your help", "Hello")
- is gibberish, random letters, or punctuation only ("???", "...", "!!!")
- complains about the photo instead of asking about it ("This image is blurry", "I can't see anything")
- is a statement, comment, or expression of frustration with no specific request
- is a test message or a placeholder
- leans on pronouns with no referent, or continues an earlier conversation ("Oh so...", "So then...", "But what about...")
- is a fragment, incomplete, or needs outside context to understand
- is not about anything that could be visible in a picture ("What am I doing wrong?")
- needs knowledge that no picture contains ("Where can I buy this?", "How many calories are in this?")

The question IS relevant only when it is a clear, standalone question about visual content that
someone could answer by looking at the picture, for example:
- "What color is this shirt?"
- "What does the label say?"
- "How many people are in this photo?"
- "What time does the clock show?"

Reply with exactly one line of JSON and nothing else:
{"is_relevant": false, "reason": "short explanation"}

Use lowercase true or false and double quotes."#;

#[derive(Error, Debug)]
pub enum VerdictParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    InvalidField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerdict {
    pub is_relevant: bool,
    pub reason: String,
}

/// Pulls the JSON object out of a model response that may be wrapped in a
/// fenced code block or surrounded by prose.
pub fn normalize_response(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(open) = text.find("```") {
        let after = &text[open + 3..];
        // drop an optional language tag such as `json`
        let body = after.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        let fenced = match body.find("```") {
            Some(close) => &body[..close],
            None => body,
        };
        text = fenced.trim();
    }

    if !text.starts_with('{') {
        if let Some(start) = text.find('{') {
            if let Some(end) = text.rfind('}') {
                if end > start {
                    text = &text[start..=end];
                }
            }
        }
    }

    text
}

/// Parses a model response into a verdict. Both `is_relevant` and `reason`
/// must be present.
pub fn parse_verdict(raw: &str) -> Result<ParsedVerdict, VerdictParseError> {
    let value: Value = serde_json::from_str(normalize_response(raw))?;
    let obj = value.as_object().ok_or(VerdictParseError::NotAnObject)?;

    let is_relevant = obj
        .get("is_relevant")
        .ok_or(VerdictParseError::MissingField("is_relevant"))?
        .as_bool()
        .ok_or(VerdictParseError::InvalidField("is_relevant"))?;

    let reason = match obj.get("reason").ok_or(VerdictParseError::MissingField("reason"))? {
        Value::String(s) => s.clone(),
        Value::Null => return Err(VerdictParseError::InvalidField("reason")),
        other => other.to_string(),
    };

    Ok(ParsedVerdict {
        is_relevant,
        reason,
    })
}

/// Relevance classifier bound to one model client for the whole run.
pub struct Classifier<'a> {
    model: &'a dyn TextModel,
    prompts: &'a PromptConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(model: &'a dyn TextModel, prompts: &'a PromptConfig) -> Self {
        Self { model, prompts }
    }

    fn build_prompt(&self, question: &str) -> String {
        format!(
            "{}\n\nQuestion to evaluate: '{}'",
            self.prompts.relevance, question
        )
    }

    /// Classifies one question. A failed model call yields `success = false`;
    /// an unparseable response is decided by the heuristic instead.
    pub fn classify(&self, question: &str) -> RelevanceVerdict {
        let preview: String = question.chars().take(50).collect();
        info!(question = %preview, "evaluating");

        let prompt = self.build_prompt(question);
        let raw = match self.model.generate(&prompt, None, &self.prompts.system) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "model call failed, item left unclassified");
                return RelevanceVerdict::failed(err.to_string());
            }
        };
        debug!(response = %raw, "model response");

        match parse_verdict(&raw) {
            Ok(parsed) => {
                info!(is_relevant = parsed.is_relevant, "model verdict");
                RelevanceVerdict {
                    success: true,
                    is_relevant: parsed.is_relevant,
                    reason: parsed.reason,
                    method: VerdictMethod::ModelBased,
                    error: None,
                    raw_response: Some(raw),
                }
            }
            Err(err) => {
                let is_relevant = heuristic_is_relevant(question);
                info!(is_relevant, error = %err, "unparseable response, heuristic verdict");
                RelevanceVerdict {
                    success: true,
                    is_relevant,
                    reason: format!("Fallback heuristic decision - parsing failed: {err}"),
                    method: VerdictMethod::HeuristicFallback,
                    error: None,
                    raw_response: Some(raw),
                }
            }
        }
    }
}
