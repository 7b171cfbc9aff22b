use crate::config::AiConfig;
use crate::providers::{http_client, json_body, parse_json_output, AiProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

/// Local Ollama server; no API key
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaProvider {
    /// Create a new Ollama provider from configuration
    pub fn new(config: &AiConfig) -> Result<Self, ProviderError> {
        Ok(OllamaProvider {
            client: http_client(config.timeout)?,
            base_url: config.base_url(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, model: String) -> Self {
        OllamaProvider {
            client: Client::new(),
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": prompt}
                ],
                "stream": false,
                "format": schema,
                "options": {
                    "temperature": self.temperature,
                    "num_predict": self.max_tokens
                }
            }))
            .send()
            .await?;

        let response_body = json_body(response).await?;
        debug!("Ollama response: {:?}", response_body);

        let content = response_body["message"]["content"].as_str().ok_or_else(|| {
            ProviderError::MissingContent("no message.content in Ollama response".to_string())
        })?;

        Ok(parse_json_output(self.provider_name(), content))
    }
}
