mod anthropic;
mod configured;
mod connection;
mod factory;
mod google;
mod ollama;
mod open_ai;
mod schema;

pub use anthropic::AnthropicProvider;
pub use configured::ConfiguredProvider;
pub use connection::{test_connection, ConnectionTestRequest, ConnectionTestResult};
pub use factory::ProviderFactory;
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use open_ai::OpenAIProvider;
pub use schema::recipe_schema;

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response had no content: {0}")]
    MissingContent(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Unified trait for all LLM providers
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Ask the model for JSON matching `schema`.
    ///
    /// `Ok(None)` means the model answered but not with parseable JSON.
    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError>;
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Body of a successful response, or `ProviderError::Api` with the error text
pub(crate) async fn json_body(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

/// Parse model text as JSON, tolerating a surrounding Markdown code fence
pub(crate) fn parse_json_output(provider: &str, text: &str) -> Option<Value> {
    let trimmed = strip_code_fence(text.trim());
    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                "{} returned non-JSON output ({} chars): {}",
                provider,
                text.len(),
                e
            );
            None
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner,
    };
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}
