//! Merging ACL requirements into a projection, and stripping them back out
//!
//! The two halves are exact inverses: for any combination of caller and
//! ACL fields/includes, stripping after merging reproduces the shape the
//! caller asked for, no matter what the ability needed along the way.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::projection::{FieldSelection, QuerySpec};
use warden_core::TARGET_KEY;

/// Union the ability's required fields and relations into the caller's
/// projection. Includes always union (caller's entries first); fields are
/// only added where the caller already restricted a relation to an
/// explicit list - every "all fields" spelling already implies them.
pub fn merge_query_with_acl_data(
    query: &QuerySpec,
    acl_fields: Option<&BTreeMap<String, Vec<String>>>,
    acl_include: Option<&[String]>,
) -> QuerySpec {
    let mut include = query.include.clone();
    if let Some(acl_include) = acl_include {
        for relation in acl_include {
            push_unique(&mut include, relation);
        }
    }

    let fields = match &query.fields {
        None => None,
        Some(map) if map.is_empty() => Some(map.clone()),
        Some(map) => {
            let mut merged = map.clone();
            if let Some(acl_fields) = acl_fields {
                for (relation, needed) in acl_fields {
                    if let Some(FieldSelection::Explicit(selected)) = merged.get_mut(relation) {
                        for field in needed {
                            push_unique(selected, field);
                        }
                    }
                }
            }
            Some(merged)
        }
    };

    QuerySpec { fields, include }
}

/// Delete from a loaded item exactly what [`merge_query_with_acl_data`]
/// would have added under the same inputs. Caller-listed fields are never
/// touched, relations the caller left unrestricted were never added to,
/// and an ACL-added relation disappears wholesale.
pub fn remove_acl_added_fields(
    item: &mut Value,
    user_fields: Option<&BTreeMap<String, FieldSelection>>,
    acl_fields: Option<&BTreeMap<String, Vec<String>>>,
    user_include: &[String],
    acl_include: Option<&[String]>,
) {
    if let Some(acl_include) = acl_include {
        if let Some(map) = item.as_object_mut() {
            for relation in acl_include {
                if !user_include.iter().any(|r| r == relation) {
                    map.remove(relation);
                }
            }
        }
    }

    let Some(user_map) = user_fields else {
        return;
    };
    if user_map.is_empty() {
        return;
    }
    let Some(acl_map) = acl_fields else {
        return;
    };

    for (relation, added) in acl_map {
        let Some(FieldSelection::Explicit(requested)) = user_map.get(relation) else {
            continue;
        };
        for field in added {
            if requested.iter().any(|f| f == field) {
                continue;
            }
            if relation == TARGET_KEY {
                remove_field(item, field);
            } else if let Some(map) = item.as_object_mut() {
                if let Some(related) = map.get_mut(relation) {
                    remove_field(related, field);
                }
            }
        }
    }
}

fn remove_field(container: &mut Value, field: &str) {
    match container {
        Value::Object(map) => {
            map.remove(field);
        }
        Value::Array(items) => {
            for item in items {
                remove_field(item, field);
            }
        }
        _ => {}
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
