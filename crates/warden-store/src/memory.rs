//! In-memory storage backend for testing and development

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::filter::filter_matches;
use crate::{ResourceStore, Result, StoreError};
use warden_query::{FieldSelection, QuerySpec};
use warden_schema::MetadataRegistry;

/// A toy store keeping one `Vec` of JSON rows per collection. Collections
/// are named after their entity type so projection can consult the
/// metadata registry for primary keys and relations.
pub struct MemoryBackend {
    registry: Arc<MetadataRegistry>,
    data: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryBackend {
    pub fn new(registry: Arc<MetadataRegistry>) -> Self {
        Self {
            registry,
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of rows currently stored in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.data
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    fn project(&self, mut row: Value, entity_type: &str, query: &QuerySpec) -> Result<Value> {
        let metadata = self.registry.get(entity_type)?;

        if let Some(map) = row.as_object_mut() {
            // Relations are exposed only when included.
            for relation in &metadata.relations {
                if !query.include.iter().any(|r| r == relation) {
                    map.remove(relation);
                }
            }

            if let FieldSelection::Explicit(selected) = query.selection(warden_query::TARGET_KEY) {
                let primary_key = metadata.primary_key.clone();
                let relations = metadata.relations.clone();
                map.retain(|key, _| {
                    *key == primary_key
                        || relations.iter().any(|r| r == key)
                        || selected.iter().any(|f| f == key)
                });
            }

            for relation in &metadata.relations {
                let FieldSelection::Explicit(selected) = query.selection(relation) else {
                    continue;
                };
                let target = metadata.relation_target(relation)?;
                let target_key = self.registry.get(target)?.primary_key.clone();
                if let Some(related) = map.get_mut(relation) {
                    retain_fields(related, &target_key, selected);
                }
            }
        }

        Ok(row)
    }
}

fn retain_fields(value: &mut Value, primary_key: &str, selected: &[String]) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| key == primary_key || selected.iter().any(|f| f == key));
        }
        Value::Array(items) => {
            for item in items {
                retain_fields(item, primary_key, selected);
            }
        }
        _ => {}
    }
}

#[async_trait]
impl ResourceStore for MemoryBackend {
    async fn fetch(
        &self,
        collection: &str,
        filter: Option<&Value>,
        query: &QuerySpec,
    ) -> Result<Vec<Value>> {
        let data = self.data.read().await;
        let rows = data
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection {
                collection: collection.to_string(),
            })?;

        let mut out = Vec::new();
        for row in rows {
            if let Some(filter) = filter {
                if !filter_matches(filter, row) {
                    continue;
                }
            }
            out.push(self.project(row.clone(), collection, query)?);
        }

        debug!(
            collection,
            matched = out.len(),
            filtered = filter.is_some(),
            "memory fetch"
        );
        Ok(out)
    }

    async fn insert(&self, collection: &str, row: Value) -> Result<()> {
        let mut data = self.data.write().await;
        data.entry(collection.to_string()).or_default().push(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_schema::EntityMetadata;

    fn registry() -> Arc<MetadataRegistry> {
        Arc::new(
            MetadataRegistry::new()
                .with(
                    EntityMetadata::new("User", ["id", "login", "role"], "id")
                        .with_relation("profile", "Profile"),
                )
                .with(EntityMetadata::new("Profile", ["id", "phone", "isPublic"], "id")),
        )
    }

    async fn backend_with_rows() -> MemoryBackend {
        let backend = MemoryBackend::new(registry());
        backend
            .insert(
                "User",
                json!({
                    "id": 1,
                    "login": "neo",
                    "role": "admin",
                    "profile": {"id": 10, "phone": "555", "isPublic": true},
                }),
            )
            .await
            .unwrap();
        backend
            .insert(
                "User",
                json!({"id": 2, "login": "smith", "role": "agent"}),
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_fetch_applies_filter() {
        let backend = backend_with_rows().await;
        let rows = backend
            .fetch(
                "User",
                Some(&json!({"$or": [{"role": "admin"}]})),
                &QuerySpec::all(),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["login"], json!("neo"));
    }

    #[tokio::test]
    async fn test_fetch_projects_explicit_fields() {
        let backend = backend_with_rows().await;
        let query = QuerySpec::all().with_fields("target", FieldSelection::explicit(["login"]));
        let rows = backend.fetch("User", None, &query).await.unwrap();

        // Primary key survives projection; unselected scalars do not.
        assert_eq!(rows[1], json!({"id": 2, "login": "smith"}));
    }

    #[tokio::test]
    async fn test_relations_need_include() {
        let backend = backend_with_rows().await;

        let rows = backend.fetch("User", None, &QuerySpec::all()).await.unwrap();
        assert!(rows[0].get("profile").is_none());

        let query = QuerySpec::all().with_include("profile");
        let rows = backend.fetch("User", None, &query).await.unwrap();
        assert_eq!(rows[0]["profile"]["phone"], json!("555"));
    }

    #[tokio::test]
    async fn test_relation_projection() {
        let backend = backend_with_rows().await;
        let query = QuerySpec::all()
            .with_include("profile")
            .with_fields("profile", FieldSelection::explicit(["isPublic"]));
        let rows = backend.fetch("User", None, &query).await.unwrap();

        assert_eq!(rows[0]["profile"], json!({"id": 10, "isPublic": true}));
    }

    #[tokio::test]
    async fn test_unknown_collection_errors() {
        let backend = MemoryBackend::new(registry());
        assert!(matches!(
            backend.fetch("Ghost", None, &QuerySpec::all()).await,
            Err(StoreError::UnknownCollection { .. })
        ));
    }
}
