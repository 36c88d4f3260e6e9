//! # Warden Query - Projection Merging and Field Restriction
//!
//! Merges an ability's authorization-only field and include requirements
//! into the caller's projection before the store runs, and strips those
//! additions (plus any forbidden fields) back out of loaded items before
//! they are returned.

use thiserror::Error;

pub mod merge;
pub mod prepare;
pub mod projection;

pub use merge::{merge_query_with_acl_data, remove_acl_added_fields};
pub use prepare::{
    prepare_acl_query, process_item_field_restrictions, AclPreparation, FieldRestriction,
    PreparedAclQuery,
};
pub use projection::{FieldSelection, QuerySpec};
pub use warden_core::TARGET_KEY;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Core(#[from] warden_core::CoreError),

    #[error(transparent)]
    Schema(#[from] warden_schema::SchemaError),
}

impl QueryError {
    /// Whether this is the ordinary "forbidden" outcome rather than a
    /// configuration or data-shape defect.
    pub fn is_denial(&self) -> bool {
        matches!(self, QueryError::Core(err) if err.is_denial())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
