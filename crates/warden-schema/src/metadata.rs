//! Per-type entity metadata

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Result, SchemaError};

/// What the engine needs to know about one entity type: its scalar
/// properties, which of them is the primary key, and its relations with
/// their target types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub type_name: String,
    pub properties: Vec<String>,
    pub primary_key: String,
    pub relations: Vec<String>,
    pub relation_target: HashMap<String, String>,
}

impl EntityMetadata {
    pub fn new(
        type_name: impl Into<String>,
        properties: impl IntoIterator<Item = impl Into<String>>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            properties: properties.into_iter().map(Into::into).collect(),
            primary_key: primary_key.into(),
            relations: Vec::new(),
            relation_target: HashMap::new(),
        }
    }

    pub fn with_relation(
        mut self,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let relation = relation.into();
        self.relation_target.insert(relation.clone(), target.into());
        self.relations.push(relation);
        self
    }

    /// Target type of a relation.
    pub fn relation_target(&self, relation: &str) -> Result<&str> {
        self.relation_target
            .get(relation)
            .map(String::as_str)
            .ok_or_else(|| SchemaError::UnknownRelationTarget {
                type_name: self.type_name.clone(),
                relation: relation.to_string(),
            })
    }
}

/// Registry of entity metadata, keyed by type name. Populated from the
/// external schema registry at startup.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    types: HashMap<String, EntityMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metadata: EntityMetadata) {
        self.types.insert(metadata.type_name.clone(), metadata);
    }

    pub fn with(mut self, metadata: EntityMetadata) -> Self {
        self.register(metadata);
        self
    }

    /// Look up a type. A missing entry is a hard error, never a silent
    /// empty result.
    pub fn get(&self, type_name: &str) -> Result<&EntityMetadata> {
        self.types
            .get(type_name)
            .ok_or_else(|| SchemaError::EntityMetadataNotFound {
                type_name: type_name.to_string(),
            })
    }
}
