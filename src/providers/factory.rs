use crate::config::{AiConfig, ProviderKind};
use crate::providers::{
    AiProvider, AnthropicProvider, GoogleProvider, OllamaProvider, OpenAIProvider, ProviderError,
};

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(config: &AiConfig) -> Result<Box<dyn AiProvider>, ProviderError> {
        match config.provider {
            ProviderKind::Openai => Ok(Box::new(OpenAIProvider::new(config)?)),
            ProviderKind::Anthropic => Ok(Box::new(AnthropicProvider::new(config)?)),
            ProviderKind::Google => Ok(Box::new(GoogleProvider::new(config)?)),
            ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(config)?)),
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        ProviderKind::ALL.iter().map(|kind| kind.as_str()).collect()
    }
}
