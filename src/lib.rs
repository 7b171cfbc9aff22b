pub mod admin;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod ingredients;
pub mod model;
pub mod normalize;
pub mod prompts;
pub mod providers;
pub mod sanitize;
pub mod settings;
pub mod store;

pub use admin::{AdminContext, AiVideoProcedures, PromptProcedures, StaticAdmins, User};
pub use config::{AiConfig, AppConfig, ProviderKind, VideoConfig};
pub use error::{AppError, Result};
pub use extract::RecipeExtractor;
pub use model::{MeasurementSystem, Recipe, RecipeIngredient, Step};
pub use prompts::{fill_prompt, PromptName, PromptResolver};
pub use sanitize::sanitize;
pub use settings::ServerSettings;
pub use store::{ConfigStore, JsonFileConfigStore, MemoryConfigStore};

use std::sync::Arc;

use crate::prompts::{DefaultPrompts, DirectoryDefaults, EmbeddedDefaults};

/// Default prompt source for `config`: its prompts directory if set, the
/// compiled-in prompts otherwise
pub fn default_prompts(config: &AppConfig) -> Arc<dyn DefaultPrompts> {
    match &config.prompts_dir {
        Some(dir) => Arc::new(DirectoryDefaults::new(dir.clone())),
        None => Arc::new(EmbeddedDefaults),
    }
}
