use crate::config::AiConfig;
use crate::providers::{http_client, json_body, parse_json_output, AiProvider, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &AiConfig) -> Result<Self, ProviderError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            ProviderError::NotConfigured(
                "GOOGLE_API_KEY not found in config or environment".to_string(),
            )
        })?;

        Ok(GoogleProvider {
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
        GoogleProvider {
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
impl AiProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&json!({
                "systemInstruction": {
                    "parts": [{"text": system}]
                },
                "contents": [{
                    "role": "user",
                    "parts": [{"text": prompt}]
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_tokens,
                    "responseMimeType": "application/json",
                    "responseSchema": schema
                }
            }))
            .send()
            .await?;

        let response_body = json_body(response).await?;
        debug!("{:?}", response_body);

        let text = response_body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::MissingContent(
                    "no candidates[0].content.parts[0].text in Gemini response".to_string(),
                )
            })?;

        Ok(parse_json_output(self.provider_name(), text))
    }
}
