use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::AppError;

/// AI provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI or any OpenAI-compatible endpoint (LM Studio, vLLM, ...)
    #[default]
    #[serde(alias = "generic-openai", alias = "lm-studio")]
    Openai,
    Anthropic,
    Google,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Openai,
        ProviderKind::Anthropic,
        ProviderKind::Google,
        ProviderKind::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Openai => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Environment variable consulted when no API key is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Openai => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Google => Some("GOOGLE_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::Openai => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI feature configuration, persisted in the config store as a sensitive value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// Master switch for every AI feature
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model identifier (e.g., "gpt-4o-mini", "claude-3-5-haiku-latest")
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL override for self-hosted or proxy endpoints
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key (can also be set via the provider's environment variable)
    #[serde(default, alias = "api_key")]
    pub api_key: Option<String>,
    /// Temperature for generation (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens", alias = "max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: ProviderKind::default(),
            model: default_model(),
            endpoint: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout: default_timeout(),
        }
    }
}

impl AiConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.trim().is_empty() {
            return Err(AppError::Validation("Model is required".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Validation(format!(
                "Temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AppError::Validation(
                "Max tokens must be positive".to_string(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint(endpoint)?;
        }
        Ok(())
    }

    /// Configured API key, falling back to the provider's environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|name| std::env::var(name).ok())
            })
    }

    /// Configured endpoint, or the provider's public API
    pub fn base_url(&self) -> String {
        self.endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.provider.default_endpoint().to_string())
    }
}

/// Video import configuration, persisted as a sensitive value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Longest video accepted for transcription
    #[serde(default = "default_max_video_length")]
    pub max_length_seconds: u32,
    #[serde(default)]
    pub transcription_provider: ProviderKind,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default)]
    pub transcription_api_key: Option<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_length_seconds: default_max_video_length(),
            transcription_provider: ProviderKind::default(),
            transcription_model: default_transcription_model(),
            transcription_api_key: None,
        }
    }
}

impl VideoConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_length_seconds == 0 {
            return Err(AppError::Validation(
                "Max video length must be positive".to_string(),
            ));
        }
        if self.enabled && self.transcription_model.trim().is_empty() {
            return Err(AppError::Validation(
                "Transcription model is required when video import is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_endpoint(endpoint: &str) -> Result<(), AppError> {
    let url = Url::parse(endpoint)
        .map_err(|e| AppError::Validation(format!("Invalid endpoint URL '{}': {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AppError::Validation(format!(
            "Unsupported endpoint scheme: {}",
            other
        ))),
    }
}

/// Process-level settings for the binary and for bootstrapping the library
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// AI config used until an admin stores one
    #[serde(default)]
    pub ai: AiConfig,
    /// Directory with `<prompt-name>.txt` defaults; embedded defaults when unset
    #[serde(default)]
    pub prompts_dir: Option<PathBuf>,
    /// Sanitized page text is truncated to this many characters
    #[serde(default = "default_max_page_chars")]
    pub max_page_chars: usize,
    /// JSON file backing the config store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// User ids with server admin capability
    #[serde(default = "default_admins")]
    pub admins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            prompts_dir: None,
            max_page_chars: default_max_page_chars(),
            store_path: default_store_path(),
            admins: default_admins(),
        }
    }
}

// Default value functions
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout() -> u64 {
    120
}

fn default_max_video_length() -> u32 {
    120
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

pub(crate) fn default_max_page_chars() -> usize {
    50_000
}

fn default_store_path() -> PathBuf {
    PathBuf::from("recipe-ai-config.json")
}

fn default_admins() -> Vec<String> {
    vec!["cli".to_string()]
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_AI__ prefix
    /// 2. recipe-ai.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_AI__AI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config("recipe-ai")
    }
}

/// Load configuration from the named file (extension optional) and the environment
pub fn load_config(file_name: &str) -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name(file_name).required(false))
        // Use double underscore for nested: RECIPE_AI__AI__ENABLED
        .add_source(
            Environment::with_prefix("RECIPE_AI")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = AiConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.provider, ProviderKind::Openai);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, 120);
        assert_eq!(default_max_page_chars(), 50_000);
    }

    #[test]
    fn test_ai_config_camel_case() {
        let config: AiConfig = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "provider": "ollama",
            "model": "llama3.1",
            "maxTokens": 1000,
            "apiKey": "secret"
        }))
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_provider_aliases() {
        let kind: ProviderKind = serde_json::from_str("\"generic-openai\"").unwrap();
        assert_eq!(kind, ProviderKind::Openai);
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = AiConfig {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let config = AiConfig {
            endpoint: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_temperature() {
        let config = AiConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let config = AiConfig {
            endpoint: Some("http://localhost:1234/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost:1234");
    }

    #[test]
    fn test_video_config_validation() {
        let config = VideoConfig {
            max_length_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(VideoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "max_page_chars = 1000\nadmins = [\"alice\"]\n\n[ai]\nenabled = true\nprovider = \"anthropic\"\nmodel = \"claude-3-5-haiku-latest\""
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.max_page_chars, 1000);
        assert_eq!(config.admins, vec!["alice".to_string()]);
        assert!(config.ai.enabled);
        assert_eq!(config.ai.provider, ProviderKind::Anthropic);
    }
}
