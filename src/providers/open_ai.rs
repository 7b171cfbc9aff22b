use crate::config::AiConfig;
use crate::providers::{http_client, json_body, parse_json_output, AiProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

/// OpenAI chat completions, also used for OpenAI-compatible servers
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &AiConfig) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config.resolved_api_key().ok_or_else(|| {
            ProviderError::NotConfigured(
                "OPENAI_API_KEY not found in config or environment".to_string(),
            )
        })?;

        Ok(OpenAIProvider {
            client: http_client(config.timeout)?,
            api_key,
            base_url: config.base_url(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

#[async_trait]
impl AiProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": prompt}
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {"name": "recipe", "schema": schema}
                }
            }))
            .send()
            .await?;

        let response_body = json_body(response).await?;
        debug!("{:?}", response_body);

        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::MissingContent("no choices[0].message.content".to_string())
            })?;

        Ok(parse_json_output(self.provider_name(), content))
    }
}
