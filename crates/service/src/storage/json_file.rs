use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use super::query::{self, Collection};
use super::{Document, DocumentStore, Filter, Query, StoreError};

type Collections = HashMap<String, Collection>;

/// JSON file-backed document store.
///
/// Keeps every collection in memory and rewrites the whole file after each
/// mutation. Suitable for local development and small single-process setups.
#[derive(Clone)]
pub struct JsonFileDocumentStore {
    inner: Arc<RwLock<Collections>>,
    file_path: PathBuf,
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl JsonFileDocumentStore {
    /// Open the store at `path`. Creates the file with no collections if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let collections: Collections = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => Collections::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Serialization(format!("{}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = Collections::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(|e| StoreError::Serialization(e.to_string()))?)
                    .await
                    .map_err(io_err)?;
                empty
            }
            Err(e) => return Err(io_err(e)),
        };

        debug!(path = %file_path.display(), collections = collections.len(), "json_store_opened");
        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(collections)), file_path }))
    }

    /// Write the snapshot through a sibling temp file so readers never see a torn file.
    async fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        let data = serde_json::to_vec(collections).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(io_err)?;
        fs::rename(&tmp, &self.file_path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let map = self.inner.read().await;
        Ok(map.get(collection).and_then(|c| c.get(key)).cloned())
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError> {
        // Held across the save so snapshots are written in mutation order.
        let mut map = self.inner.write().await;
        let previous = map.entry(collection.to_string()).or_default().insert(key.to_string(), doc);
        if let Err(e) = self.save(&map).await {
            // A failed write must not stay visible.
            if let Some(c) = map.get_mut(collection) {
                match previous {
                    Some(prev) => {
                        c.insert(key.to_string(), prev);
                    }
                    None => {
                        c.remove(key);
                    }
                }
            }
            warn!(collection, key, error = %e, "json_store_set_rolled_back");
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let mut map = self.inner.write().await;
        let Some(removed) = map.get_mut(collection).and_then(|c| c.remove(key)) else {
            return Ok(false);
        };
        if let Err(e) = self.save(&map).await {
            map.entry(collection.to_string()).or_default().insert(key.to_string(), removed);
            warn!(collection, key, error = %e, "json_store_delete_rolled_back");
            return Err(e);
        }
        Ok(true)
    }

    async fn query(&self, collection: &str, q: &Query) -> Result<Vec<(String, Document)>, StoreError> {
        q.validate()?;
        let map = self.inner.read().await;
        Ok(map.get(collection).map(|c| query::run(c, q)).unwrap_or_default())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        filters.iter().try_for_each(Filter::validate)?;
        let map = self.inner.read().await;
        Ok(map.get(collection).map_or(0, |c| query::count(c, filters)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn json_file_store_persists_across_reopen() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_document_store_{}.json", uuid::Uuid::new_v4()));
        let store = JsonFileDocumentStore::new(&tmp).await?;

        // initially empty
        assert_eq!(store.count("Potni_stroski", &[]).await?, 0);

        store.set("Potni_stroski", "a_1", super::super::to_document(&json!({ "oseba": "a" }))?).await?;
        store.set("Potni_stroski", "b_1", super::super::to_document(&json!({ "oseba": "b" }))?).await?;
        assert!(store.delete("Potni_stroski", "b_1").await?);
        assert!(!store.delete("Potni_stroski", "b_1").await?);

        // reload from disk
        let reloaded = JsonFileDocumentStore::new(&tmp).await?;
        assert_eq!(reloaded.count("Potni_stroski", &[]).await?, 1);
        let doc = reloaded.get("Potni_stroski", "a_1").await?.expect("persisted");
        assert_eq!(doc.get("oseba"), Some(&json!("a")));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_writes_are_not_kept() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("json_document_store_{}", uuid::Uuid::new_v4()));
        let store = JsonFileDocumentStore::new(dir.join("data.json")).await?;
        store.set("Potni_stroski", "a_1", super::super::to_document(&json!({ "oseba": "a" }))?).await?;

        tokio::fs::remove_dir_all(&dir).await?;

        let res = store.set("Potni_stroski", "b_1", super::super::to_document(&json!({ "oseba": "b" }))?).await;
        assert!(matches!(res, Err(StoreError::Backend(_))));
        assert!(store.get("Potni_stroski", "b_1").await?.is_none());

        let res = store.set("Potni_stroski", "a_1", super::super::to_document(&json!({ "oseba": "z" }))?).await;
        assert!(res.is_err());
        assert_eq!(store.get("Potni_stroski", "a_1").await?.and_then(|d| d.get("oseba").cloned()), Some(json!("a")));

        assert!(store.delete("Potni_stroski", "a_1").await.is_err());
        assert!(store.get("Potni_stroski", "a_1").await?.is_some());
        assert_eq!(store.count("Potni_stroski", &[]).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_document_store_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"{not json").await?;
        assert!(matches!(JsonFileDocumentStore::new(&tmp).await, Err(StoreError::Serialization(_))));
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
