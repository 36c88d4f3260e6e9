//! Sample rule templates, contexts, and helpers

use std::collections::HashMap;

use serde_json::{json, Value};
use warden_core::{helper, ConditionMap, HelperMap, Rule};

fn conditions(value: Value) -> ConditionMap {
    value
        .as_object()
        .expect("fixture conditions are objects")
        .clone()
}

/// Context for a plain authenticated reader.
pub fn reader_context(user_id: i64) -> Value {
    json!({
        "currentUserId": user_id,
        "user": { "id": user_id, "role": "member" },
    })
}

/// Rules granting access to one's own articles only.
pub fn author_only_rules(action: &str) -> Vec<Rule> {
    vec![Rule::new(action, "Articles")
        .with_conditions(conditions(json!({"authorId": "${currentUserId}"})))]
}

/// The helper functions the sample rule sets rely on.
pub fn default_helpers() -> HelperMap {
    let mut helpers: HelperMap = HashMap::new();

    helpers.insert(
        "lower".to_string(),
        helper(|args| {
            let s = args
                .first()
                .and_then(Value::as_str)
                .ok_or("lower expects a string")?;
            Ok(Value::String(s.to_lowercase()))
        }),
    );

    helpers.insert(
        "concat".to_string(),
        helper(|args| {
            let mut out = String::new();
            for arg in args {
                match arg {
                    Value::String(s) => out.push_str(s),
                    other => out.push_str(&other.to_string()),
                }
            }
            Ok(Value::String(out))
        }),
    );

    helpers
}
