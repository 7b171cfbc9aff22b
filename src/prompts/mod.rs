//! Named prompts: admin overrides in the config store, built-in defaults otherwise.

mod defaults;

pub use defaults::{DefaultPrompts, DirectoryDefaults, EmbeddedDefaults};

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::AppError;
use crate::store::{get_typed, ConfigKey, ConfigStore};

/// Prompts an admin can override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptName {
    RecipeExtraction,
    UnitConversion,
}

impl PromptName {
    pub const ALL: [PromptName; 2] = [PromptName::RecipeExtraction, PromptName::UnitConversion];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptName::RecipeExtraction => "recipe-extraction",
            PromptName::UnitConversion => "unit-conversion",
        }
    }

    pub fn config_key(&self) -> ConfigKey {
        match self {
            PromptName::RecipeExtraction => ConfigKey::PromptRecipeExtraction,
            PromptName::UnitConversion => ConfigKey::PromptUnitConversion,
        }
    }
}

impl fmt::Display for PromptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown prompt: {}", s)))
    }
}

/// Admin replacement for a built-in prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOverride {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub content: String,
    pub is_custom: bool,
}

/// Resolves the effective text of a prompt
#[derive(Clone)]
pub struct PromptResolver {
    store: Arc<dyn ConfigStore>,
    defaults: Arc<dyn DefaultPrompts>,
}

impl PromptResolver {
    pub fn new(store: Arc<dyn ConfigStore>, defaults: Arc<dyn DefaultPrompts>) -> Self {
        Self { store, defaults }
    }

    pub async fn override_for(&self, name: PromptName) -> Result<Option<PromptOverride>, AppError> {
        Ok(get_typed::<PromptOverride>(self.store.as_ref(), name.config_key()).await?)
    }

    pub async fn default_content(&self, name: PromptName) -> Result<String, AppError> {
        self.defaults.default_for(name).await
    }

    pub async fn resolve(&self, name: PromptName) -> Result<ResolvedPrompt, AppError> {
        if let Some(prompt_override) = self.override_for(name).await? {
            debug!("Using custom '{}' prompt", name);
            return Ok(ResolvedPrompt {
                content: prompt_override.content,
                is_custom: true,
            });
        }

        Ok(ResolvedPrompt {
            content: self.default_content(name).await?,
            is_custom: false,
        })
    }

    /// Effective prompt text
    pub async fn load(&self, name: PromptName) -> Result<String, AppError> {
        Ok(self.resolve(name).await?.content)
    }
}

/// Replace every `{{key}}` in `template` with its value.
///
/// Values are inserted literally and never rescanned; placeholders without a
/// value stay as they are.
pub fn fill_prompt(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            rest = &rest[start..];
            break;
        };

        match vars.get(&after_open[..end]) {
            Some(value) => {
                result.push_str(value);
                rest = &after_open[end + 2..];
            }
            None => {
                // Not a known placeholder; retry one brace later ("{{{a}}}")
                result.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    result.push_str(rest);
    result
}
