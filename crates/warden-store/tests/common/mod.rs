//! Helper utilities for end-to-end authorization tests

use std::sync::Arc;

use serde_json::Value;
use warden_core::{Ability, Materializer, Rule};
use warden_query::{prepare_acl_query, AclPreparation, QuerySpec};
use warden_schema::MetadataRegistry;
use warden_store::{MemoryBackend, ResourceStore};
use warden_test_fixtures::{article_registry, default_helpers};

/// End-to-end fixture: a seeded memory store plus ability construction
/// and the query-preparation pipeline.
pub struct TestFixture {
    pub registry: Arc<MetadataRegistry>,
    pub store: MemoryBackend,
}

impl TestFixture {
    pub fn new() -> Self {
        let registry = Arc::new(article_registry());
        let store = MemoryBackend::new(Arc::clone(&registry));
        Self { registry, store }
    }

    pub async fn seed(&self, collection: &str, rows: Vec<Value>) -> anyhow::Result<()> {
        for row in rows {
            self.store.insert(collection, row).await?;
        }
        Ok(())
    }

    pub fn ability(&self, subject: &str, action: &str, rules: Vec<Rule>, context: Value) -> Ability {
        Ability::new(
            subject,
            action,
            rules,
            context,
            default_helpers(),
            Materializer::default(),
        )
        .expect("fixture rules materialize")
    }

    /// Run the full read path: prepare the query against the ability,
    /// fetch with the compiled filter and merged projection, and return
    /// the rows together with the preparation outcome.
    pub async fn fetch_for(
        &self,
        ability: &Ability,
        collection: &str,
        query: &QuerySpec,
    ) -> anyhow::Result<(Vec<Value>, AclPreparation)> {
        let prepared = prepare_acl_query(ability, query, true)?;

        let rows = match &prepared {
            AclPreparation::Unrestricted => self.store.fetch(collection, None, query).await?,
            AclPreparation::Restricted(p) => {
                let filter = p
                    .acl_query_data
                    .as_ref()
                    .and_then(|data| data.rules_for_query.as_ref());
                self.store.fetch(collection, filter, &p.merged_query).await?
            }
        };

        Ok((rows, prepared))
    }
}

