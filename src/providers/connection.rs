use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{AiConfig, ProviderKind};
use crate::providers::anthropic::ANTHROPIC_VERSION;
use crate::providers::{http_client, json_body, ProviderError};

const CONNECTION_TEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestRequest {
    pub provider: ProviderKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ConnectionTestRequest {
    fn as_config(&self) -> AiConfig {
        AiConfig {
            provider: self.provider,
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    /// Model identifiers reported by the endpoint
    pub models: Vec<String>,
}

impl ConnectionTestResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            models: Vec::new(),
        }
    }
}

/// List the endpoint's models to check that it is reachable and the key works.
///
/// Failures are reported in the result, never as an error.
pub async fn test_connection(request: ConnectionTestRequest) -> ConnectionTestResult {
    let config = request.as_config();
    let api_key = config.resolved_api_key();

    if config.provider.api_key_env().is_some() && api_key.is_none() {
        return ConnectionTestResult::failure(format!(
            "An API key is required for {}",
            config.provider
        ));
    }

    match list_models(&config, api_key.as_deref().unwrap_or_default()).await {
        Ok(models) => {
            debug!(
                "Connection test for {} found {} models",
                config.provider,
                models.len()
            );
            ConnectionTestResult {
                success: true,
                message: format!(
                    "Connected to {} ({} models available)",
                    config.provider,
                    models.len()
                ),
                models,
            }
        }
        Err(e) => {
            warn!("Connection test for {} failed: {}", config.provider, e);
            ConnectionTestResult::failure(e.to_string())
        }
    }
}

async fn list_models(config: &AiConfig, api_key: &str) -> Result<Vec<String>, ProviderError> {
    let client = http_client(CONNECTION_TEST_TIMEOUT_SECS)?;
    let base_url = config.base_url();

    let request = match config.provider {
        ProviderKind::Openai => client
            .get(format!("{}/v1/models", base_url))
            .bearer_auth(api_key),
        ProviderKind::Anthropic => client
            .get(format!("{}/v1/models", base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION),
        ProviderKind::Google => client
            .get(format!("{}/v1beta/models", base_url))
            .query(&[("key", api_key)]),
        ProviderKind::Ollama => client.get(format!("{}/api/tags", base_url)),
    };

    let body = json_body(request.send().await?).await?;

    let (list_field, id_field) = match config.provider {
        ProviderKind::Openai | ProviderKind::Anthropic => ("data", "id"),
        ProviderKind::Google | ProviderKind::Ollama => ("models", "name"),
    };

    let entries = body[list_field].as_array().ok_or_else(|| {
        ProviderError::MissingContent(format!("no '{}' list in model listing", list_field))
    })?;

    Ok(entries
        .iter()
        .filter_map(|entry| entry[id_field].as_str())
        .map(|id| id.trim_start_matches("models/").to_string())
        .collect())
}
