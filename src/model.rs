use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Item identifier normalised to its string form.
///
/// Training snapshots and validation files disagree on whether ids are
/// integers or strings, so every id is compared through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// String form of an arbitrary JSON id. `null` maps to an empty id.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(s.clone()),
            Value::Null => Self(String::new()),
            other => Self(other.to_string()),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Training,
    Validation,
}

impl SourceKind {
    /// File name of the discard artifact for this source.
    pub fn discard_file_name(self) -> &'static str {
        match self {
            SourceKind::Training => "train_to_discard.json",
            SourceKind::Validation => "validation_to_discard.json",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Training => f.write_str("training"),
            SourceKind::Validation => f.write_str("validation"),
        }
    }
}

/// One question/image pair read from a source collection.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionItem {
    pub id: ItemId,
    pub question: Option<String>,
    pub image_reference: Option<String>,
    pub metadata: Map<String, Value>,
}

impl QuestionItem {
    /// Builds an item from a raw metadata mapping (`image_url`, `question`, ...).
    pub fn from_metadata(id: ItemId, metadata: Map<String, Value>) -> Self {
        let text = |key: &str| {
            metadata
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        };
        let question = text("question");
        let image_reference = text("image_url");
        Self {
            id,
            question,
            image_reference,
            metadata,
        }
    }

    /// Majority crowd answer, empty when the source does not carry one.
    pub fn crowd_majority(&self) -> String {
        match self.metadata.get("crowd_majority") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictMethod {
    ModelBased,
    HeuristicFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceVerdict {
    pub success: bool,
    pub is_relevant: bool,
    pub reason: String,
    pub method: VerdictMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl RelevanceVerdict {
    /// Verdict for a model call that never produced a response. Carries no judgment.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            is_relevant: false,
            reason: String::new(),
            method: VerdictMethod::ModelBased,
            error: Some(error),
            raw_response: None,
        }
    }

    /// True only for a successful verdict that judged the question unusable.
    pub fn is_discard(&self) -> bool {
        self.success && !self.is_relevant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardEvaluation {
    pub is_relevant: bool,
    pub reason: String,
    pub method: VerdictMethod,
}

/// One row of a discard artifact. Everything but `id` is there for the reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardEntry {
    pub id: ItemId,
    pub image_url: String,
    pub question: String,
    pub crowd_majority: String,
    pub evaluation: DiscardEvaluation,
}

impl DiscardEntry {
    pub fn new(item: &QuestionItem, verdict: &RelevanceVerdict) -> Self {
        Self {
            id: item.id.clone(),
            image_url: item.image_reference.clone().unwrap_or_default(),
            question: item.question.clone().unwrap_or_default(),
            crowd_majority: item.crowd_majority(),
            evaluation: DiscardEvaluation {
                is_relevant: verdict.is_relevant,
                reason: verdict.reason.clone(),
                method: verdict.method,
            },
        }
    }
}
