use crate::config::AiConfig;
use crate::providers::{http_client, json_body, parse_json_output, AiProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &AiConfig) -> Result<Self, ProviderError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            ProviderError::NotConfigured(
                "ANTHROPIC_API_KEY not found in config or environment".to_string(),
            )
        })?;

        Ok(AnthropicProvider {
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
        AnthropicProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

/// The messages API has no schema parameter, so the schema rides in the system prompt
fn system_with_schema(system: &str, schema: &Value) -> String {
    format!(
        "{}\n\nRespond with a single JSON object matching this JSON schema and nothing else:\n{}",
        system, schema
    )
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": system_with_schema(system, schema),
                "messages": [
                    {
                        "role": "user",
                        "content": prompt
                    }
                ]
            }))
            .send()
            .await?;

        let response_body = json_body(response).await?;
        debug!("{:?}", response_body);

        let text = response_body["content"][0]["text"].as_str().ok_or_else(|| {
            ProviderError::MissingContent("no content[0].text in Anthropic response".to_string())
        })?;

        Ok(parse_json_output(self.provider_name(), text))
    }
}
