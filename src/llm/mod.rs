use crate::error::Result;

pub mod openai;

pub use openai::ChatClient;

/// Text-generation collaborator used by the classifier.
pub trait TextModel {
    /// Sends `prompt` with `system_prompt` and returns the raw response text.
    /// Relevance classification always passes `image_urls = None`.
    fn generate(
        &self,
        prompt: &str,
        image_urls: Option<&[String]>,
        system_prompt: &str,
    ) -> Result<String>;
}
