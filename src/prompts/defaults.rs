use async_trait::async_trait;
use std::path::PathBuf;

use super::PromptName;
use crate::error::AppError;

/// Read-only source of built-in prompt text
#[async_trait]
pub trait DefaultPrompts: Send + Sync {
    async fn default_for(&self, name: PromptName) -> Result<String, AppError>;
}

/// Defaults compiled into the binary.
///
/// The prompts are loaded from the `.txt` files next to this module at
/// compile time using `include_str!`, so they can be edited without dealing
/// with Rust string syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedDefaults;

impl EmbeddedDefaults {
    pub fn text(name: PromptName) -> &'static str {
        match name {
            PromptName::RecipeExtraction => include_str!("recipe-extraction.txt"),
            PromptName::UnitConversion => include_str!("unit-conversion.txt"),
        }
    }
}

#[async_trait]
impl DefaultPrompts for EmbeddedDefaults {
    async fn default_for(&self, name: PromptName) -> Result<String, AppError> {
        Ok(Self::text(name).to_string())
    }
}

/// Defaults read from `<dir>/<prompt-name>.txt` on every call
#[derive(Debug, Clone)]
pub struct DirectoryDefaults {
    dir: PathBuf,
}

impl DirectoryDefaults {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DefaultPrompts for DirectoryDefaults {
    async fn default_for(&self, name: PromptName) -> Result<String, AppError> {
        let path = self.dir.join(format!("{}.txt", name));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::DefaultPromptMissing {
                name,
                reason: format!("{}: {}", path.display(), e),
            })
    }
}
