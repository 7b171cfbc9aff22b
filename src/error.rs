use thiserror::Error;

use crate::prompts::PromptName;
use crate::providers::ProviderError;
use crate::store::StoreError;

/// Errors that can occur in admin procedures and recipe extraction
#[derive(Error, Debug)]
pub enum AppError {
    /// No authenticated caller
    #[error("Authentication required")]
    Unauthorized,

    /// Caller is authenticated but lacks the required capability
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected before any store mutation
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Built-in default prompt could not be loaded
    #[error("Default prompt '{name}' unavailable: {reason}")]
    DefaultPromptMissing { name: PromptName, reason: String },

    /// Config store failure
    #[error("Config store error: {0}")]
    Store(#[from] StoreError),

    /// AI provider failure
    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
