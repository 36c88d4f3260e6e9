//! Integration test: merge/strip round trip
//!
//! For every combination of caller and ACL projections, stripping after
//! merging must reproduce exactly the shape the caller's own query would
//! have produced, while fields the caller requested survive untouched.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use warden_query::{merge_query_with_acl_data, remove_acl_added_fields, FieldSelection, QuerySpec};

const RELATIONS: [&str; 2] = ["profile", "audit"];

/// The full row as the store would hold it, relations loaded.
fn full_item() -> Value {
    json!({
        "id": 1,
        "login": "neo",
        "role": "admin",
        "secret": "s3cr3t",
        "profile": {"id": 10, "phone": "555", "isPublic": true},
        "audit": {"id": 20, "note": "n"},
    })
}

/// What a store fetch under `query` returns: relations only when
/// included, explicit field lists plus the primary key.
fn project(item: &Value, query: &QuerySpec) -> Value {
    let mut out = item.clone();
    let map = out.as_object_mut().unwrap();

    for relation in RELATIONS {
        if !query.include.iter().any(|r| r == relation) {
            map.remove(relation);
        }
    }

    if let FieldSelection::Explicit(selected) = query.selection("target") {
        let keep: Vec<String> = selected.clone();
        map.retain(|key, _| {
            key == "id" || RELATIONS.contains(&key.as_str()) || keep.iter().any(|f| f == key)
        });
    }

    for relation in RELATIONS {
        let FieldSelection::Explicit(selected) = query.selection(relation).clone() else {
            continue;
        };
        if let Some(Value::Object(related)) = map.get_mut(relation) {
            related.retain(|key, _| key == "id" || selected.iter().any(|f| f == key));
        }
    }

    out
}

fn field_options() -> Vec<Option<BTreeMap<String, FieldSelection>>> {
    vec![
        None,
        Some(BTreeMap::new()),
        Some(BTreeMap::from([("target".to_string(), FieldSelection::All)])),
        Some(BTreeMap::from([(
            "target".to_string(),
            FieldSelection::explicit(["login"]),
        )])),
        Some(BTreeMap::from([
            ("target".to_string(), FieldSelection::explicit(["login", "role"])),
            ("profile".to_string(), FieldSelection::explicit(["phone"])),
        ])),
    ]
}

fn acl_field_options() -> Vec<Option<BTreeMap<String, Vec<String>>>> {
    vec![
        None,
        Some(BTreeMap::from([(
            "target".to_string(),
            vec!["role".to_string()],
        )])),
        Some(BTreeMap::from([
            ("target".to_string(), vec!["role".to_string(), "login".to_string()]),
            ("profile".to_string(), vec!["isPublic".to_string()]),
        ])),
    ]
}

fn include_options() -> Vec<Vec<String>> {
    vec![vec![], vec!["profile".to_string()]]
}

fn acl_include_options() -> Vec<Option<Vec<String>>> {
    vec![
        None,
        Some(vec!["profile".to_string()]),
        Some(vec!["audit".to_string()]),
        Some(vec!["profile".to_string(), "audit".to_string()]),
    ]
}

#[test]
fn test_round_trip_over_all_combinations() {
    let item = full_item();

    for user_fields in field_options() {
        for acl_fields in acl_field_options() {
            for user_include in include_options() {
                for acl_include in acl_include_options() {
                    let user_query = QuerySpec {
                        fields: user_fields.clone(),
                        include: user_include.clone(),
                    };

                    let merged = merge_query_with_acl_data(
                        &user_query,
                        acl_fields.as_ref(),
                        acl_include.as_deref(),
                    );

                    let mut fetched = project(&item, &merged);
                    remove_acl_added_fields(
                        &mut fetched,
                        user_query.fields.as_ref(),
                        acl_fields.as_ref(),
                        &user_query.include,
                        acl_include.as_deref(),
                    );

                    let expected = project(&item, &user_query);
                    assert_eq!(
                        fetched, expected,
                        "round trip failed for user_fields={user_fields:?} \
                         acl_fields={acl_fields:?} user_include={user_include:?} \
                         acl_include={acl_include:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_merge_field_union_and_null_passthrough() {
    // target ["id"] + ACL target ["role"] unions.
    let query = QuerySpec::all().with_fields("target", FieldSelection::explicit(["id"]));
    let acl = BTreeMap::from([("target".to_string(), vec!["role".to_string()])]);
    let merged = merge_query_with_acl_data(&query, Some(&acl), None);
    assert_eq!(
        merged.fields.unwrap()["target"],
        FieldSelection::explicit(["id", "role"])
    );

    // fields: null stays null no matter what ACL needs.
    let merged = merge_query_with_acl_data(&QuerySpec::all(), Some(&acl), None);
    assert_eq!(merged.fields, None);
}
