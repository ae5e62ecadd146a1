//! Primary store with an in-memory fallback.

use std::collections::HashSet;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::{BlobStore, FileBlobStore, MemoryBlobStore, PetError, PetKey};

/// Pet state storage as the HTTP layer sees it.
///
/// Reads and writes go to the primary backend when one is configured. A
/// primary failure is logged and the in-memory fallback serves the
/// request instead, so a save is never rejected because the disk is
/// unavailable.
///
/// A key saved to the fallback is marked dirty, and reads of a dirty key
/// are answered from the fallback even after the primary recovers, so
/// an older primary copy never shadows a newer save. The mark clears on
/// the next successful primary write.
#[derive(Debug)]
pub struct PetStore<P: BlobStore = FileBlobStore> {
    primary: Option<P>,
    fallback: MemoryBlobStore,
    dirty: RwLock<HashSet<PetKey>>,
}

impl<P: BlobStore> PetStore<P> {
    /// A store with no primary; everything lives in memory.
    pub fn memory_only() -> Self {
        Self {
            primary: None,
            fallback: MemoryBlobStore::new(),
            dirty: RwLock::default(),
        }
    }

    /// A store that prefers `primary`.
    pub fn with_primary(primary: P) -> Self {
        Self {
            primary: Some(primary),
            fallback: MemoryBlobStore::new(),
            dirty: RwLock::default(),
        }
    }

    /// Returns `true` if a primary backend is configured.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Reads the value for a raw key.
    ///
    /// # Errors
    /// Returns [`PetError::InvalidKey`] for a malformed key. Backend
    /// errors are absorbed by the fallback.
    pub async fn get(&self, raw_key: &str) -> Result<Option<Value>, PetError> {
        let key = PetKey::parse(raw_key)?;
        if let Some(primary) = &self.primary {
            if !self.dirty.read().await.contains(&key) {
                match primary.get(&key).await {
                    Ok(Some(value)) => return Ok(Some(value)),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(%key, error = %e, "primary pet store read failed, using memory");
                    }
                }
            }
        }
        self.fallback.get(&key).await
    }

    /// Writes the value for a raw key.
    ///
    /// # Errors
    /// Returns [`PetError::InvalidKey`] for a malformed key. Backend
    /// errors are absorbed by the fallback.
    pub async fn set(&self, raw_key: &str, value: Value) -> Result<(), PetError> {
        let key = PetKey::parse(raw_key)?;
        if let Some(primary) = &self.primary {
            match primary.set(&key, value.clone()).await {
                Ok(()) => {
                    self.dirty.write().await.remove(&key);
                    tracing::debug!(%key, "pet state saved");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "primary pet store write failed, using memory");
                }
            }
        }
        self.fallback.set(&key, value).await?;
        if self.primary.is_some() {
            self.dirty.write().await.insert(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use super::*;

    /// A backend that can be switched into a failing state.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryBlobStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), PetError> {
            if self.down.load(Ordering::SeqCst) {
                Err(std::io::Error::other("backend down").into())
            } else {
                Ok(())
            }
        }
    }

    impl BlobStore for FlakyStore {
        async fn get(&self, key: &PetKey) -> Result<Option<Value>, PetError> {
            self.check()?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &PetKey, value: Value) -> Result<(), PetError> {
            self.check()?;
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn test_memory_only_set_then_get() {
        let store = PetStore::<FileBlobStore>::memory_only();
        assert!(!store.has_primary());
        store.set("alice", json!({ "mood": "happy" })).await.unwrap();
        assert_eq!(
            store.get("alice").await.unwrap(),
            Some(json!({ "mood": "happy" }))
        );
    }

    #[tokio::test]
    async fn test_invalid_key_is_rejected_before_any_backend() {
        let store = PetStore::with_primary(FlakyStore::default());
        assert!(matches!(
            store.set("../x", json!(1)).await,
            Err(PetError::InvalidKey(_))
        ));
        assert!(matches!(store.get("").await, Err(PetError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_primary_used_when_healthy() {
        let store = PetStore::with_primary(FlakyStore::default());
        store.set("alice", json!(1)).await.unwrap();
        assert!(store.fallback.is_empty().await);
        assert_eq!(store.get("alice").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_write_during_outage_survives_recovery() {
        let store = PetStore::with_primary(FlakyStore::default());
        store.primary.as_ref().unwrap().down.store(true, Ordering::SeqCst);

        store.set("alice", json!({ "level": 2 })).await.unwrap();
        assert_eq!(
            store.get("alice").await.unwrap(),
            Some(json!({ "level": 2 }))
        );

        // Primary back up but never saw the write: fallback still answers.
        store.primary.as_ref().unwrap().down.store(false, Ordering::SeqCst);
        assert_eq!(
            store.get("alice").await.unwrap(),
            Some(json!({ "level": 2 }))
        );
    }

    #[tokio::test]
    async fn test_outage_write_shadows_older_primary_value() {
        let store = PetStore::with_primary(FlakyStore::default());
        let primary = store.primary.as_ref().unwrap();

        store.set("alice", json!({ "level": 1 })).await.unwrap();
        primary.down.store(true, Ordering::SeqCst);
        store.set("alice", json!({ "level": 2 })).await.unwrap();
        primary.down.store(false, Ordering::SeqCst);

        assert_eq!(
            store.get("alice").await.unwrap(),
            Some(json!({ "level": 2 }))
        );

        // A later healthy write goes back to the primary and wins.
        store.set("alice", json!({ "level": 3 })).await.unwrap();
        assert_eq!(
            primary.get(&PetKey::parse("alice").unwrap()).await.unwrap(),
            Some(json!({ "level": 3 }))
        );
        assert_eq!(
            store.get("alice").await.unwrap(),
            Some(json!({ "level": 3 }))
        );
    }
}
