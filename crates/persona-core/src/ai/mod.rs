pub mod gemini;
pub mod ollama;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::config::{Config, GEMINI_KEY_ENV};
use crate::error::CompletionError;
use crate::provider::Provider;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// A text-in, text-out language model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Model shown in the chat header.
    fn model(&self) -> &str;
}

/// Build the client the config asks for.
pub fn client_for(config: &Config) -> Result<Arc<dyn CompletionClient>> {
    let model = config.model();
    let client: Arc<dyn CompletionClient> = match config.provider() {
        Provider::Gemini => {
            let key = config.gemini_api_key().ok_or_else(|| {
                anyhow!(
                    "Gemini API key not configured. Set {} or add gemini_api_key to the config file.",
                    GEMINI_KEY_ENV
                )
            })?;
            Arc::new(GeminiClient::new(&key, &model))
        }
        Provider::Ollama => Arc::new(OllamaClient::new(config.ollama_url(), &model)),
    };
    Ok(client)
}
