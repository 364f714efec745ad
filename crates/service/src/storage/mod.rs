//! Document store abstraction for the service layer
//!
//! Stores are collection-scoped key → JSON-object maps with equality,
//! membership and range filters, key-ordered scans and key cursors. The
//! expense and user stores only ever talk to a `DocumentStore`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod json_file;
pub mod memory;
pub mod query;
pub mod seaorm;

pub use json_file::JsonFileDocumentStore;
pub use memory::MemoryDocumentStore;
pub use seaorm::SeaOrmDocumentStore;

/// A stored document body.
pub type Document = serde_json::Map<String, Value>;

/// Largest value list accepted by a membership filter.
pub const MAX_IN_VALUES: usize = 30;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<models::errors::ModelError> for StoreError {
    fn from(err: models::errors::ModelError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Predicate on a top-level document field.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Membership; 1..=`MAX_IN_VALUES` values.
    In(String, Vec<Value>),
    Gte(String, Value),
    Lt(String, Value),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn in_values<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(field.to_string(), value.into())
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lt(field.to_string(), value.into())
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(f, _) | Filter::In(f, _) | Filter::Gte(f, _) | Filter::Lt(f, _) => f,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.field().is_empty() {
            return Err(StoreError::InvalidQuery("filter field must not be empty".into()));
        }
        if let Filter::In(field, values) = self {
            if values.is_empty() || values.len() > MAX_IN_VALUES {
                return Err(StoreError::InvalidQuery(format!(
                    "'in' filter on {field} needs 1..={MAX_IN_VALUES} values, got {}",
                    values.len()
                )));
            }
        }
        Ok(())
    }
}

/// Filtered, key-ordered scan of one collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    /// Only keys strictly greater than this one.
    pub start_after: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self { Self::default() }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn start_after(mut self, key: Option<String>) -> Self {
        self.start_after = key;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        self.filters.iter().try_for_each(Filter::validate)
    }
}

/// Collection-scoped document persistence.
///
/// Contract relied upon by the stores:
/// - `set` replaces the whole document
/// - `get` of an absent key is `Ok(None)`
/// - `query` returns documents in ascending key order
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;
    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StoreError>;
    /// Returns whether the document existed.
    async fn delete(&self, collection: &str, key: &str) -> Result<bool, StoreError>;
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<(String, Document)>, StoreError>;
    async fn count(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError>;
}

/// Serialize a record into a document body.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!("expected a JSON object, got {other}"))),
    }
}

/// Decode a stored document into a record.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Overwrite the keys of `doc` with those present in `patch`; other keys are kept.
pub fn shallow_merge<T: Serialize>(doc: &mut Document, patch: &T) -> Result<(), StoreError> {
    for (key, value) in to_document(patch)? {
        doc.insert(key, value);
    }
    Ok(())
}
