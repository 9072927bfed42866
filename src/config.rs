use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::classifier::{DEFAULT_RELEVANCE_PROMPT, DEFAULT_SYSTEM_PROMPT};
use crate::error::{CurateError, Result};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vqa-curate.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub prompts: PromptConfig,
    pub paths: PathsConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub name: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".into(),
            name: "gemini-2.5-pro".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub system: String,
    pub relevance: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.into(),
            relevance: DEFAULT_RELEVANCE_PROMPT.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub vector_store: PathBuf,
    pub train_collection: String,
    pub train_collection_description: String,
    pub validation_items: PathBuf,
    pub evaluation_input: PathBuf,
    pub results_dir: PathBuf,
    pub cleaned_output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            vector_store: PathBuf::from("data/chroma_export"),
            train_collection: "vizwiz_500_sample_cosine".into(),
            train_collection_description: "500 random VizWiz samples".into(),
            validation_items: PathBuf::from("data/embeddings/lf_vqa_validation_embeddings_cohere.json"),
            evaluation_input: PathBuf::from("data/evaluation.jsonl"),
            results_dir: PathBuf::from("results"),
            cleaned_output_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Pause after every model call, as a humantime string ("100ms").
    pub delay: String,
    pub max_train_samples: Option<usize>,
    pub max_validation_samples: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            delay: "100ms".into(),
            max_train_samples: None,
            max_validation_samples: None,
        }
    }
}

impl ScanConfig {
    pub fn delay(&self) -> Result<Duration> {
        humantime::parse_duration(&self.delay)
            .map_err(|err| CurateError::Config(format!("invalid scan.delay {:?}: {err}", self.delay)))
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads `path` when given (it must exist), otherwise the default file
    /// if present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.exists() => {
                return Err(CurateError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        tracing::info!(path = %path.display(), "loading config");
        Self::from_toml(&fs::read_to_string(&path)?)
    }
}
