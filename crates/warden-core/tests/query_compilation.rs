//! Integration test: compiling rule sets into store filters

use std::collections::HashMap;

use serde_json::{json, Value};
use warden_core::{
    validate_no_current_in_rules, validate_rules_for_orm, Ability, ConditionMap, CoreError,
    Materializer, Rule,
};

fn conditions(value: Value) -> ConditionMap {
    value.as_object().unwrap().clone()
}

fn ability(action: &str, rules: Vec<Rule>, context: Value) -> Ability {
    Ability::new(
        "Users",
        action,
        rules,
        context,
        HashMap::new(),
        Materializer::default(),
    )
    .unwrap()
}

#[test]
fn test_materialized_condition_compiles_to_filter() {
    let a = ability(
        "getAll",
        vec![Rule::new("getAll", "Users")
            .with_conditions(conditions(json!({"authorId": "${currentUserId}"})))],
        json!({"currentUserId": 123}),
    );

    assert_eq!(
        a.rules()[0].conditions,
        Some(conditions(json!({"authorId": 123})))
    );

    let data = a.get_query_object().unwrap();
    assert_eq!(data.rules_for_query, Some(json!({"$or": [{"authorId": 123}]})));
    assert_eq!(data.fields.unwrap()["target"], vec!["authorId"]);
}

#[test]
fn test_regex_condition_translates() {
    let a = ability(
        "getAll",
        vec![Rule::new("getAll", "Users")
            .with_conditions(conditions(json!({"name": {"$regex": "^John"}})))],
        json!({}),
    );

    let data = a.get_query_object().unwrap();
    assert_eq!(
        data.rules_for_query,
        Some(json!({"$or": [{"name": {"$re": "^John"}}]}))
    );
}

#[test]
fn test_relation_conditions_require_includes() {
    let a = ability(
        "getAll",
        vec![Rule::new("getAll", "Users").with_conditions(conditions(json!({
            "$or": [
                {"profile.isPublic": true},
                {"authorId": "${currentUserId}"},
            ]
        })))],
        json!({"currentUserId": 5}),
    );

    let data = a.get_query_object().unwrap();
    assert_eq!(data.include, Some(vec!["profile".to_string()]));

    let fields = data.fields.unwrap();
    assert_eq!(fields["profile"], vec!["isPublic"]);
    assert_eq!(fields["target"], vec!["authorId"]);

    assert_eq!(
        data.rules_for_query,
        Some(json!({"$or": [{
            "$or": [
                {"profile": {"isPublic": true}},
                {"authorId": 5},
            ]
        }]}))
    );
}

#[test]
fn test_size_is_rejected_before_any_query() {
    let a = ability(
        "getAll",
        vec![Rule::new("getAll", "Users")
            .with_conditions(conditions(json!({"tags": {"$size": 3}})))],
        json!({}),
    );

    assert!(matches!(
        validate_rules_for_orm(&a),
        Err(CoreError::UnsupportedOperator { operator }) if operator == "$size"
    ));
}

#[test]
fn test_current_reference_requires_update_action() {
    let template = vec![Rule::new("getAll", "Users")
        .with_conditions(conditions(json!({"revision": "${@input.__current.revision}"})))];

    let a = ability("getAll", template.clone(), json!({}));
    assert!(matches!(
        validate_no_current_in_rules(&a),
        Err(CoreError::InvalidCurrentReference { .. })
    ));

    let mut update_rules = template;
    update_rules[0].action = "updateOne".to_string();
    let a = ability("updateOne", update_rules, json!({}));
    assert!(validate_no_current_in_rules(&a).is_ok());
}
