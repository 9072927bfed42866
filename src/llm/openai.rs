use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use super::TextModel;
use crate::config::ModelConfig;
use crate::error::{CurateError, Result};

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Builds the client from config, reading the API key from the configured
    /// environment variable. A missing key is a configuration error.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CurateError::Config(format!(
                    "{} is not set; add it to the environment or a .env file",
                    config.api_key_env
                ))
            })?;
        Self::new(
            &config.base_url,
            api_key,
            config.name.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn user_content(prompt: &str, image_urls: Option<&[String]>) -> Value {
    match image_urls {
        Some(urls) if !urls.is_empty() => {
            let mut parts = vec![json!({ "type": "text", "text": prompt })];
            parts.extend(
                urls.iter()
                    .map(|url| json!({ "type": "image_url", "image_url": { "url": url } })),
            );
            Value::Array(parts)
        }
        _ => Value::String(prompt.to_string()),
    }
}

pub(crate) fn build_request_body(
    model: &str,
    prompt: &str,
    image_urls: Option<&[String]>,
    system_prompt: &str,
) -> Value {
    let mut messages = Vec::with_capacity(2);
    if !system_prompt.is_empty() {
        messages.push(json!({ "role": "system", "content": system_prompt }));
    }
    messages.push(json!({ "role": "user", "content": user_content(prompt, image_urls) }));
    json!({ "model": model, "messages": messages })
}

fn first_choice_content(resp: ChatResponse) -> Result<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| CurateError::Model("response contained no message content".to_string()))
}

impl TextModel for ChatClient {
    fn generate(
        &self,
        prompt: &str,
        image_urls: Option<&[String]>,
        system_prompt: &str,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request_body(&self.model, prompt, image_urls, system_prompt);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(CurateError::Model(format!("{status}: {text}")));
        }

        first_choice_content(response.json::<ChatResponse>()?)
    }
}
