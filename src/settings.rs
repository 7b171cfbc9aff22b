//! Typed read access to server settings kept in the config store.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AiConfig, VideoConfig};
use crate::ingredients::UnitTable;
use crate::store::{get_typed, ConfigKey, ConfigStore, StoreError};

/// Who may act on a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Everyone,
    Household,
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePermissionPolicy {
    pub view: PermissionLevel,
    pub edit: PermissionLevel,
    pub delete: PermissionLevel,
}

impl Default for RecipePermissionPolicy {
    fn default() -> Self {
        Self {
            view: PermissionLevel::Household,
            edit: PermissionLevel::Household,
            delete: PermissionLevel::Owner,
        }
    }
}

#[derive(Clone)]
pub struct ServerSettings {
    store: Arc<dyn ConfigStore>,
    /// Used until an admin stores an AI config
    fallback_ai: AiConfig,
}

impl ServerSettings {
    pub fn new(store: Arc<dyn ConfigStore>, fallback_ai: AiConfig) -> Self {
        Self { store, fallback_ai }
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// The stored AI config, or the fallback when none is stored.
    ///
    /// A stored config that no longer parses reads as the fallback with AI
    /// turned off, so a corrupt entry never re-enables what an admin disabled.
    pub async fn ai_config(&self) -> Result<AiConfig, StoreError> {
        let Some(value) = self.store.get(ConfigKey::AiConfig).await? else {
            return Ok(self.fallback_ai.clone());
        };

        match serde_json::from_value(value) {
            Ok(config) => Ok(config),
            Err(e) => {
                error!("Stored AI config is malformed, treating AI as disabled: {}", e);
                Ok(AiConfig {
                    enabled: false,
                    ..self.fallback_ai.clone()
                })
            }
        }
    }

    pub async fn is_ai_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.ai_config().await?.enabled)
    }

    pub async fn video_config(&self) -> Result<VideoConfig, StoreError> {
        Ok(get_typed(self.store.as_ref(), ConfigKey::VideoConfig)
            .await?
            .unwrap_or_default())
    }

    pub async fn units(&self) -> Result<UnitTable, StoreError> {
        Ok(get_typed(self.store.as_ref(), ConfigKey::Units)
            .await?
            .unwrap_or_default())
    }

    pub async fn recipe_permission_policy(&self) -> Result<RecipePermissionPolicy, StoreError> {
        Ok(get_typed(self.store.as_ref(), ConfigKey::RecipePermissionPolicy)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::UnitDefinition;
    use crate::store::{set_typed, MemoryConfigStore};
    use serde_json::json;

    fn settings(store: Arc<MemoryConfigStore>) -> ServerSettings {
        ServerSettings::new(store, AiConfig::default())
    }

    #[tokio::test]
    async fn test_defaults_when_store_is_empty() {
        let settings = settings(Arc::new(MemoryConfigStore::new()));

        assert!(!settings.is_ai_enabled().await.unwrap());
        assert_eq!(settings.video_config().await.unwrap(), VideoConfig::default());
        assert_eq!(settings.units().await.unwrap(), UnitTable::default());
        assert_eq!(
            settings.recipe_permission_policy().await.unwrap(),
            RecipePermissionPolicy::default()
        );
    }

    #[tokio::test]
    async fn test_fallback_ai_config() {
        let fallback = AiConfig {
            enabled: true,
            ..Default::default()
        };
        let settings = ServerSettings::new(Arc::new(MemoryConfigStore::new()), fallback);
        assert!(settings.is_ai_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_ai_config_disables_ai() {
        let store = Arc::new(MemoryConfigStore::new());
        store
            .set(ConfigKey::AiConfig, json!({"enabled": "yes please"}), "admin-1", true)
            .await
            .unwrap();
        let fallback = AiConfig {
            enabled: true,
            model: "fallback-model".to_string(),
            ..Default::default()
        };
        let settings = ServerSettings::new(store, fallback);

        assert!(!settings.is_ai_enabled().await.unwrap());
        assert_eq!(settings.ai_config().await.unwrap().model, "fallback-model");
    }

    #[tokio::test]
    async fn test_stored_values_win() {
        let store = Arc::new(MemoryConfigStore::new());
        let ai = AiConfig {
            enabled: true,
            model: "llama3.1".to_string(),
            ..Default::default()
        };
        set_typed(store.as_ref(), ConfigKey::AiConfig, &ai, "admin", true)
            .await
            .unwrap();
        let units = UnitTable::new(vec![UnitDefinition {
            id: "handful".to_string(),
            system: None,
            aliases: vec!["handfuls".to_string()],
        }]);
        set_typed(store.as_ref(), ConfigKey::Units, &units, "admin", false)
            .await
            .unwrap();

        let settings = settings(store);
        assert_eq!(settings.ai_config().await.unwrap(), ai);
        assert_eq!(settings.units().await.unwrap(), units);
    }

    #[test]
    fn test_policy_serialization() {
        assert_eq!(
            serde_json::to_value(RecipePermissionPolicy::default()).unwrap(),
            json!({"view": "household", "edit": "household", "delete": "owner"})
        );
    }
}
