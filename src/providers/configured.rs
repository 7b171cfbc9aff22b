use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::providers::{AiProvider, ProviderError, ProviderFactory};
use crate::settings::ServerSettings;

/// Provider built from the stored AI config on every call, so admin changes
/// apply without a restart
pub struct ConfiguredProvider {
    settings: ServerSettings,
}

impl ConfiguredProvider {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AiProvider for ConfiguredProvider {
    fn provider_name(&self) -> &str {
        "configured"
    }

    async fn generate_structured_output(
        &self,
        prompt: &str,
        schema: &Value,
        system: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let config = self.settings.ai_config().await.map_err(|e| {
            ProviderError::NotConfigured(format!("could not read AI config: {}", e))
        })?;
        let provider = ProviderFactory::create(&config)?;
        debug!(
            "Using {} provider with model {}",
            provider.provider_name(),
            config.model
        );

        provider
            .generate_structured_output(prompt, schema, system)
            .await
    }
}
