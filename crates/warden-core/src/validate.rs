//! Rule-shape validation ahead of query execution
//!
//! The store cannot express every portable operator, and the reserved
//! `__current` input key only has meaning while an update is in flight.
//! Both checks run structurally over the rule set and fail on the first
//! offence, in rule order then leaf order.

use serde_json::Value;

use crate::ability::Ability;
use crate::types::{Rule, CURRENT_KEY};
use crate::{operators, CoreError, Result};

/// Actions that carry a pre-change entity and may therefore reference
/// `__current` in their rules.
const UPDATE_ACTION_PREFIXES: [&str; 3] = ["update", "replace", "patch"];

/// Reject rule sets containing operators the store cannot execute.
pub fn validate_rules_for_orm(ability: &Ability) -> Result<()> {
    for rule in ability.rules() {
        if let Some(conditions) = &rule.conditions {
            for (key, value) in conditions {
                find_unsupported_in(key, value)?;
            }
        }
    }
    Ok(())
}

fn find_unsupported_in(key: &str, value: &Value) -> Result<()> {
    if operators::is_unsupported(key) {
        return Err(CoreError::UnsupportedOperator {
            operator: key.to_string(),
        });
    }
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                find_unsupported_in(k, v)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Value::Object(map) = item {
                    for (k, v) in map {
                        find_unsupported_in(k, v)?;
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Reject rules that reference the `__current` entity outside an
/// update-style action.
pub fn validate_no_current_in_rules(ability: &Ability) -> Result<()> {
    if is_update_action(ability.action()) {
        return Ok(());
    }
    for rule in ability.template_rules() {
        if rule_mentions_current(rule) {
            return Err(CoreError::InvalidCurrentReference {
                action: ability.action().to_string(),
            });
        }
    }
    Ok(())
}

pub fn is_update_action(action: &str) -> bool {
    UPDATE_ACTION_PREFIXES
        .iter()
        .any(|prefix| action.starts_with(prefix))
}

fn rule_mentions_current(rule: &Rule) -> bool {
    match serde_json::to_value(rule) {
        Ok(value) => value_mentions_current(&value),
        Err(_) => false,
    }
}

fn value_mentions_current(value: &Value) -> bool {
    match value {
        Value::String(text) => text.contains(CURRENT_KEY),
        Value::Array(items) => items.iter().any(value_mentions_current),
        Value::Object(map) => map
            .iter()
            .any(|(key, v)| key.contains(CURRENT_KEY) || value_mentions_current(v)),
        _ => false,
    }
}
