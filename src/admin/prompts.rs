use futures::future::try_join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{require_admin, AdminContext, AdminDirectory, MutationResult};
use crate::error::AppError;
use crate::prompts::{DefaultPrompts, PromptName, PromptOverride, PromptResolver};
use crate::store::{set_typed, ConfigStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDetails {
    pub name: PromptName,
    /// Effective text: the override if present, the default otherwise
    pub content: String,
    pub is_custom: bool,
    pub default_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStatus {
    pub name: PromptName,
    pub is_custom: bool,
}

/// Get, override, reset and list the AI prompts
pub struct PromptProcedures {
    store: Arc<dyn ConfigStore>,
    resolver: PromptResolver,
    admins: Arc<dyn AdminDirectory>,
}

impl PromptProcedures {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        defaults: Arc<dyn DefaultPrompts>,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        Self {
            resolver: PromptResolver::new(store.clone(), defaults),
            store,
            admins,
        }
    }

    pub async fn get_prompt(
        &self,
        ctx: &AdminContext,
        name: PromptName,
    ) -> Result<PromptDetails, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;
        debug!("User {} getting prompt '{}'", user.id, name);

        let prompt_override = self.resolver.override_for(name).await?;
        let default_content = self.resolver.default_content(name).await?;

        Ok(match prompt_override {
            Some(PromptOverride { content }) => PromptDetails {
                name,
                content,
                is_custom: true,
                default_content,
            },
            None => PromptDetails {
                name,
                content: default_content.clone(),
                is_custom: false,
                default_content,
            },
        })
    }

    pub async fn update_prompt(
        &self,
        ctx: &AdminContext,
        name: PromptName,
        content: String,
    ) -> Result<MutationResult, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;

        if content.is_empty() {
            return Err(AppError::Validation(
                "Prompt content is required".to_string(),
            ));
        }

        info!(
            "User {} updating prompt '{}' ({} chars)",
            user.id,
            name,
            content.len()
        );

        set_typed(
            self.store.as_ref(),
            name.config_key(),
            &PromptOverride { content },
            &user.id,
            false,
        )
        .await?;

        Ok(MutationResult::ok())
    }

    /// Remove the override so the default applies again
    pub async fn reset_prompt(
        &self,
        ctx: &AdminContext,
        name: PromptName,
    ) -> Result<MutationResult, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;
        info!("User {} resetting prompt '{}' to default", user.id, name);

        self.store.delete(name.config_key()).await?;

        Ok(MutationResult::ok())
    }

    pub async fn list_prompts(&self, ctx: &AdminContext) -> Result<Vec<PromptStatus>, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;
        debug!("User {} listing prompts", user.id);

        try_join_all(PromptName::ALL.into_iter().map(|name| async move {
            Ok::<_, AppError>(PromptStatus {
                name,
                is_custom: self.resolver.override_for(name).await?.is_some(),
            })
        }))
        .await
    }
}
