//! Query preparation and per-item field restriction

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::merge::{merge_query_with_acl_data, remove_acl_added_fields};
use crate::projection::QuerySpec;
use crate::Result;
use warden_core::{validate_rules_for_orm, Ability, AclQueryData};
use warden_schema::MetadataRegistry;

/// The outcome of preparing a caller's query against an ability.
#[derive(Debug, Clone, PartialEq)]
pub enum AclPreparation {
    /// The ability imposes nothing; run the caller's query verbatim.
    Unrestricted,
    /// The query was augmented and the result needs post-processing.
    Restricted(PreparedAclQuery),
}

impl AclPreparation {
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AclPreparation::Unrestricted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAclQuery {
    /// True when row conditions exist but no field restriction does: the
    /// store applies the whole filter and per-item redaction can be
    /// skipped entirely.
    pub store_filter_complete: bool,
    /// The compiled filter and its field/include requirements, present
    /// only when conditions exist.
    pub acl_query_data: Option<AclQueryData>,
    /// The caller's query with ACL requirements merged in.
    pub merged_query: QuerySpec,
}

/// One item's redactions, for inclusion in response metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRestriction {
    pub id: Value,
    pub fields: Vec<String>,
}

/// Augment `query` with everything `ability` needs from the store.
///
/// Fast-path: an ability with no rules, or with neither conditions nor
/// fields, restricts nothing. Otherwise the rule set is validated against
/// the store's operator vocabulary (unless `validate` is off), compiled,
/// and merged into the caller's projection.
#[instrument(skip(ability, query), fields(subject = %ability.subject(), action = %ability.action()))]
pub fn prepare_acl_query(
    ability: &Ability,
    query: &QuerySpec,
    validate: bool,
) -> Result<AclPreparation> {
    if !ability.has_rules() || (!ability.has_conditions() && !ability.has_fields()) {
        debug!("ability imposes no restriction");
        return Ok(AclPreparation::Unrestricted);
    }

    if validate && ability.has_conditions() {
        validate_rules_for_orm(ability)?;
    }

    let acl_query_data = if ability.has_conditions() {
        Some(ability.get_query_object()?)
    } else {
        None
    };

    let merged_query = match &acl_query_data {
        Some(data) => merge_query_with_acl_data(
            query,
            data.fields.as_ref(),
            data.include.as_deref(),
        ),
        None => query.clone(),
    };

    let store_filter_complete = ability.has_conditions() && !ability.has_fields();
    debug!(store_filter_complete, "prepared ACL query");

    Ok(AclPreparation::Restricted(PreparedAclQuery {
        store_filter_complete,
        acl_query_data,
        merged_query,
    }))
}

/// Apply per-field permission checks to one loaded item, then strip the
/// ACL-added fields and relations. Returns the field paths that were
/// redacted because the actor may not see them.
pub fn process_item_field_restrictions(
    ability: &Ability,
    item: &mut Value,
    entity_type: &str,
    registry: &MetadataRegistry,
    user_query: &QuerySpec,
    acl: Option<&AclQueryData>,
) -> Result<Vec<String>> {
    // Field checks evaluate conditions against the item as loaded, not as
    // partially redacted.
    let snapshot = item.clone();
    let paths = warden_schema::fields(&snapshot, entity_type, registry)?;

    let mut redacted = Vec::new();
    for path in paths {
        if !ability.can(ability.action(), &snapshot, Some(&path)) {
            remove_path(item, &path);
            redacted.push(path);
        }
    }
    if !redacted.is_empty() {
        debug!(count = redacted.len(), "redacted forbidden fields");
    }

    let (acl_fields, acl_include) = match acl {
        Some(data) => (data.fields.as_ref(), data.include.as_deref()),
        None => (None, None),
    };
    remove_acl_added_fields(
        item,
        user_query.fields.as_ref(),
        acl_fields,
        &user_query.include,
        acl_include,
    );

    Ok(redacted)
}

fn remove_path(item: &mut Value, path: &str) {
    match path.split_once('.') {
        None => match item {
            Value::Object(map) => {
                map.remove(path);
            }
            Value::Array(items) => {
                for entry in items {
                    remove_path(entry, path);
                }
            }
            _ => {}
        },
        Some((head, rest)) => match item {
            Value::Object(map) => {
                if let Some(next) = map.get_mut(head) {
                    remove_path(next, rest);
                }
            }
            Value::Array(items) => {
                for entry in items {
                    remove_path(entry, path);
                }
            }
            _ => {}
        },
    }
}
