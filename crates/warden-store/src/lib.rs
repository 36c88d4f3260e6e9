//! # Warden Store - Resource Store Contract
//!
//! The async contract the engine expects from the underlying data store,
//! plus an in-memory backend that executes the translated operator
//! vocabulary. The real store lives outside the engine; the memory
//! backend exists so compiled filters and merged projections can be
//! exercised end to end in tests and development.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use warden_query::QuerySpec;

pub mod filter;
pub mod memory;

pub use memory::MemoryBackend;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unknown collection '{collection}'")]
    UnknownCollection { collection: String },

    #[error(transparent)]
    Schema(#[from] warden_schema::SchemaError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Executes filtered, projected reads against one collection per entity
/// type. Filters arrive in the store vocabulary produced by rule
/// compilation (`$re`, `$contains`, comparisons, `$not`/`$and`/`$or`).
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch rows matching `filter`, projected down to `query`.
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<&Value>,
        query: &QuerySpec,
    ) -> Result<Vec<Value>>;

    /// Insert one row into a collection.
    async fn insert(&self, collection: &str, row: Value) -> Result<()>;
}
