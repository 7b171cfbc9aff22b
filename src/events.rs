//! In-process fan-out of permission-related config changes.

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::settings::RecipePermissionPolicy;

const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PermissionEvent {
    /// Sent when a setting that affects what users may do has changed
    #[serde(rename_all = "camelCase")]
    PolicyUpdated {
        recipe_policy: RecipePermissionPolicy,
    },
}

#[derive(Clone)]
pub struct PermissionsEmitter {
    tx: broadcast::Sender<PermissionEvent>,
}

impl Default for PermissionsEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PermissionsEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Send `event` to current subscribers; having none is not an error
    pub fn broadcast(&self, event: PermissionEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("Broadcast permission event to {} subscribers", count),
            Err(_) => debug!("Permission event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PermissionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
