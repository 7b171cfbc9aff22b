//! Server config key-value store.
//!
//! Values are opaque JSON at the storage layer; callers go through
//! [`get_typed`] and [`set_typed`] so each key is read back as its own type.

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed store data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fixed set of server config keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    AiConfig,
    VideoConfig,
    PromptRecipeExtraction,
    PromptUnitConversion,
    Units,
    RecipePermissionPolicy,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::AiConfig => "ai_config",
            ConfigKey::VideoConfig => "video_config",
            ConfigKey::PromptRecipeExtraction => "prompt_recipe_extraction",
            ConfigKey::PromptUnitConversion => "prompt_unit_conversion",
            ConfigKey::Units => "units",
            ConfigKey::RecipePermissionPolicy => "recipe_permission_policy",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored value plus its audit fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredValue {
    pub value: Value,
    pub updated_by: String,
    /// Sensitive values hold credentials and must not be echoed to clients
    pub sensitive: bool,
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, key: ConfigKey) -> Result<Option<Value>, StoreError>;

    async fn set(
        &self,
        key: ConfigKey,
        value: Value,
        actor_id: &str,
        sensitive: bool,
    ) -> Result<(), StoreError>;

    async fn delete(&self, key: ConfigKey) -> Result<(), StoreError>;
}

/// Read `key` as `T`.
///
/// A stored value of the wrong shape is reported as absent, so a corrupt
/// entry degrades to the caller's default instead of failing the request.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn ConfigStore,
    key: ConfigKey,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_value(value) {
        Ok(typed) => Ok(Some(typed)),
        Err(e) => {
            warn!("Ignoring malformed value for config key '{}': {}", key, e);
            Ok(None)
        }
    }
}

pub async fn set_typed<T: Serialize + Sync>(
    store: &dyn ConfigStore,
    key: ConfigKey,
    value: &T,
    actor_id: &str,
    sensitive: bool,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value)?;
    store.set(key, value, actor_id, sensitive).await
}

/// In-process store; the default for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    entries: RwLock<BTreeMap<ConfigKey, StoredValue>>,
    mutations: AtomicUsize,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entry(&self, key: ConfigKey) -> Option<StoredValue> {
        self.entries.read().await.get(&key).cloned()
    }

    /// Number of `set` and `delete` calls served so far
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: ConfigKey) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(&key).map(|e| e.value.clone()))
    }

    async fn set(
        &self,
        key: ConfigKey,
        value: Value,
        actor_id: &str,
        sensitive: bool,
    ) -> Result<(), StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.insert(
            key,
            StoredValue {
                value,
                updated_by: actor_id.to_string(),
                sensitive,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: ConfigKey) -> Result<(), StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.remove(&key);
        Ok(())
    }
}

/// Store persisted as one pretty-printed JSON document
pub struct JsonFileConfigStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<ConfigKey, StoredValue>>,
}

impl JsonFileConfigStore {
    /// Open the store at `path`; a missing file starts empty
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Config store {} does not exist yet", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `entries` to a sibling temp file, then rename it over the store
    /// file so a failed write never leaves a truncated document behind.
    async fn persist(&self, entries: &BTreeMap<ConfigKey, StoredValue>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(entries)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, contents).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    async fn get(&self, key: ConfigKey) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(&key).map(|e| e.value.clone()))
    }

    async fn set(
        &self,
        key: ConfigKey,
        value: Value,
        actor_id: &str,
        sensitive: bool,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        updated.insert(
            key,
            StoredValue {
                value,
                updated_by: actor_id.to_string(),
                sensitive,
            },
        );
        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }

    async fn delete(&self, key: ConfigKey) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(&key);
        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }
}
