use log::info;
use std::sync::Arc;

use super::{require_admin, AdminContext, AdminDirectory, MutationResult};
use crate::config::{validate_endpoint, AiConfig, VideoConfig};
use crate::error::AppError;
use crate::events::{PermissionEvent, PermissionsEmitter};
use crate::providers::{test_connection, ConnectionTestRequest, ConnectionTestResult};
use crate::settings::ServerSettings;
use crate::store::{set_typed, ConfigKey};

/// AI and video import configuration
pub struct AiVideoProcedures {
    settings: ServerSettings,
    emitter: PermissionsEmitter,
    admins: Arc<dyn AdminDirectory>,
}

impl AiVideoProcedures {
    pub fn new(
        settings: ServerSettings,
        emitter: PermissionsEmitter,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        Self {
            settings,
            emitter,
            admins,
        }
    }

    /// Store a new AI config.
    ///
    /// Toggling `enabled` changes what every user can do, so it broadcasts
    /// the recipe policy to subscribers.
    pub async fn update_ai_config(
        &self,
        ctx: &AdminContext,
        config: AiConfig,
    ) -> Result<MutationResult, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;
        config.validate()?;

        info!(
            "User {} updating AI config (enabled: {}, provider: {})",
            user.id, config.enabled, config.provider
        );

        let was_enabled = self.settings.is_ai_enabled().await?;

        set_typed(
            self.settings.store().as_ref(),
            ConfigKey::AiConfig,
            &config,
            &user.id,
            true,
        )
        .await?;

        if was_enabled != config.enabled {
            info!(
                "AI enabled state changed to {}, broadcasting policy update",
                config.enabled
            );
            let recipe_policy = self.settings.recipe_permission_policy().await?;
            self.emitter
                .broadcast(PermissionEvent::PolicyUpdated { recipe_policy });
        }

        Ok(MutationResult::ok())
    }

    pub async fn update_video_config(
        &self,
        ctx: &AdminContext,
        config: VideoConfig,
    ) -> Result<MutationResult, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;
        config.validate()?;

        info!(
            "User {} updating video config (enabled: {})",
            user.id, config.enabled
        );

        // Holds the transcription API key
        set_typed(
            self.settings.store().as_ref(),
            ConfigKey::VideoConfig,
            &config,
            &user.id,
            true,
        )
        .await?;

        Ok(MutationResult::ok())
    }

    pub async fn test_ai_endpoint(
        &self,
        ctx: &AdminContext,
        request: ConnectionTestRequest,
    ) -> Result<ConnectionTestResult, AppError> {
        let user = require_admin(ctx, self.admins.as_ref()).await?;
        if let Some(endpoint) = &request.endpoint {
            validate_endpoint(endpoint)?;
        }

        info!(
            "User {} testing AI endpoint for {}",
            user.id, request.provider
        );

        Ok(test_connection(request).await)
    }
}
