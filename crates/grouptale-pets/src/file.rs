//! A blob store that keeps one JSON file per key in a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde_json::Value;

use crate::{BlobStore, PetError, PetKey};

/// Stores each blob as `<dir>/<key>.json`.
///
/// Writes go to a randomly named temporary file first and are then
/// renamed into place, so a reader never sees a half-written blob.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Uses `dir` as the storage directory. The directory is created on
    /// first write if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &PetKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl BlobStore for FileBlobStore {
    async fn get(&self, key: &PetKey) -> Result<Option<Value>, PetError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &PetKey, value: Value) -> Result<(), PetError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec(&value)?;
        let suffix: u32 = rand::rng().random();
        let tmp = self
            .dir
            .join(format!(".{}.{suffix:08x}.tmp", key.as_str()));

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn scratch_dir() -> PathBuf {
        let suffix: u64 = rand::rng().random();
        std::env::temp_dir().join(format!("grouptale-pets-{suffix:016x}"))
    }

    #[tokio::test]
    async fn test_file_store_round_trips_through_disk() {
        let dir = scratch_dir();
        let store = FileBlobStore::new(&dir);
        let key = PetKey::parse("bob").unwrap();

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.set(&key, json!({ "name": "Mochi" })).await.unwrap();

        // A second store over the same directory sees the value.
        let reopened = FileBlobStore::new(&dir);
        assert_eq!(
            reopened.get(&key).await.unwrap(),
            Some(json!({ "name": "Mochi" }))
        );
        assert!(dir.join("bob.json").exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_corrupt_blob_is_serde_error() {
        let dir = scratch_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("carol.json"), b"{oops").await.unwrap();

        let store = FileBlobStore::new(&dir);
        let result = store.get(&PetKey::parse("carol").unwrap()).await;
        assert!(matches!(result, Err(PetError::Serde(_))));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
