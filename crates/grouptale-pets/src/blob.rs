//! The blob store trait and its in-memory implementation.
//!
//! # Why a trait?
//!
//! Pet state can live on local disk, in a hosted key-value service, or
//! only in memory during development. [`BlobStore`] defines WHAT a
//! backend does (get and set a JSON value by key) so [`PetStore`] can
//! compose any of them with a fallback.
//!
//! [`PetStore`]: crate::PetStore

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::{PetError, PetKey};

/// Key-value storage for JSON blobs.
///
/// `Send + Sync + 'static` lets one store be shared by every request task.
pub trait BlobStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if unset.
    fn get(
        &self,
        key: &PetKey,
    ) -> impl Future<Output = Result<Option<Value>, PetError>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &PetKey,
        value: Value,
    ) -> impl Future<Output = Result<(), PetError>> + Send;
}

/// A [`BlobStore`] that keeps values in a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<PetKey, Value>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &PetKey) -> Result<Option<Value>, PetError> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &PetKey, value: Value) -> Result<(), PetError> {
        self.blobs.write().await.insert(key.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_then_get() {
        let store = MemoryBlobStore::new();
        let key = PetKey::parse("alice").unwrap();

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.set(&key, json!({ "hunger": 3 })).await.unwrap();
        store.set(&key, json!({ "hunger": 1 })).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(json!({ "hunger": 1 })));
        assert_eq!(store.len().await, 1);
    }
}
