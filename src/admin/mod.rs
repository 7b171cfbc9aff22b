//! Server-admin procedures.
//!
//! Every procedure checks the caller before touching the config store.

mod ai_video;
mod prompts;

pub use ai_video::AiVideoProcedures;
pub use prompts::{PromptDetails, PromptProcedures, PromptStatus};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Per-request caller information
#[derive(Debug, Clone, Default)]
pub struct AdminContext {
    pub user: Option<User>,
}

impl AdminContext {
    pub fn for_user(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Acknowledgement returned by admin mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
}

impl MutationResult {
    pub(crate) fn ok() -> Self {
        Self { success: true }
    }
}

#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_server_admin(&self, user_id: &str) -> Result<bool, AppError>;
}

/// Fixed set of admin user ids, typically from `AppConfig::admins`
#[derive(Debug, Clone, Default)]
pub struct StaticAdmins {
    ids: HashSet<String>,
}

impl StaticAdmins {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AdminDirectory for StaticAdmins {
    async fn is_server_admin(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.ids.contains(user_id))
    }
}

/// The calling user, if they are a server admin
pub async fn require_admin<'a>(
    ctx: &'a AdminContext,
    directory: &dyn AdminDirectory,
) -> Result<&'a User, AppError> {
    let user = ctx.user.as_ref().ok_or(AppError::Unauthorized)?;

    if !directory.is_server_admin(&user.id).await? {
        return Err(AppError::Forbidden(
            "Server admin access required".to_string(),
        ));
    }

    Ok(user)
}
