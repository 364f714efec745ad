use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::query::{self, Collection};
use super::{Document, DocumentStore, Filter, Query, StoreError};

/// Process-local document store. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let map = self.collections.read().await;
        Ok(map.get(collection).and_then(|c| c.get(key)).cloned())
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError> {
        let mut map = self.collections.write().await;
        map.entry(collection.to_string()).or_default().insert(key.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let mut map = self.collections.write().await;
        Ok(map.get_mut(collection).and_then(|c| c.remove(key)).is_some())
    }

    async fn query(&self, collection: &str, q: &Query) -> Result<Vec<(String, Document)>, StoreError> {
        q.validate()?;
        let map = self.collections.read().await;
        Ok(map.get(collection).map(|c| query::run(c, q)).unwrap_or_default())
    }

    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        filters.iter().try_for_each(Filter::validate)?;
        let map = self.collections.read().await;
        Ok(map.get(collection).map_or(0, |c| query::count(c, filters)))
    }
}
