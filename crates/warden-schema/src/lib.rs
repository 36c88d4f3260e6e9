//! # Warden Schema - Entity Metadata and Field Extraction
//!
//! Holds per-type entity metadata supplied by the surrounding framework's
//! schema registry and walks loaded entity graphs to produce the field
//! paths a per-field authorization check must examine.

use thiserror::Error;

pub mod diff;
pub mod extract;
pub mod metadata;

pub use diff::changed_attributes;
pub use extract::{fields, props};
pub use metadata::{EntityMetadata, MetadataRegistry};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("No entity metadata registered for type '{type_name}'")]
    EntityMetadataNotFound { type_name: String },

    #[error("Relation '{relation}' on type '{type_name}' has no target type")]
    UnknownRelationTarget {
        type_name: String,
        relation: String,
    },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
