//! Condition evaluation against entity instances
//!
//! Interprets the portable condition vocabulary (literal equality,
//! operator maps, `$or`/`$and`/`$nor`/`$not` combinators, dotted relation
//! paths) over a loaded entity represented as JSON.

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::Value;
use tracing::warn;

use crate::types::ConditionMap;

/// Whether an instance satisfies a condition tree. Keys at one level
/// combine conjunctively.
pub fn matches(conditions: &ConditionMap, instance: &Value) -> bool {
    conditions.iter().all(|(key, expected)| match key.as_str() {
        "$or" => branch_list(expected)
            .map(|branches| branches.iter().any(|b| matches(b, instance)))
            .unwrap_or(false),
        "$and" => branch_list(expected)
            .map(|branches| branches.iter().all(|b| matches(b, instance)))
            .unwrap_or(false),
        "$nor" => branch_list(expected)
            .map(|branches| !branches.iter().any(|b| matches(b, instance)))
            .unwrap_or(false),
        "$not" => expected
            .as_object()
            .map(|inner| !matches(inner, instance))
            .unwrap_or(false),
        path => {
            let segments: Vec<&str> = path.split('.').collect();
            check_segments(instance, &segments, expected)
        }
    })
}

fn branch_list(value: &Value) -> Option<Vec<&ConditionMap>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_object).collect())
}

/// Walk a dotted path. Arrays along the way fan out: the condition holds
/// if any element satisfies the remaining path.
fn check_segments(current: &Value, segments: &[&str], expected: &Value) -> bool {
    if segments.is_empty() {
        return check_value(Some(current), expected);
    }
    match current {
        Value::Object(map) => match map.get(segments[0]) {
            Some(next) => check_segments(next, &segments[1..], expected),
            None => check_value(None, expected),
        },
        Value::Array(items) => items
            .iter()
            .any(|item| check_segments(item, segments, expected)),
        _ => check_value(None, expected),
    }
}

fn check_value(actual: Option<&Value>, expected: &Value) -> bool {
    if let Some(ops) = operator_map(expected) {
        return ops
            .iter()
            .all(|(op, operand)| op_matches(actual, op, operand));
    }
    loose_eq(actual.unwrap_or(&Value::Null), expected)
}

/// An object whose keys are all `$`-operators is an operator map; anything
/// else is a literal to compare against.
fn operator_map(value: &Value) -> Option<&ConditionMap> {
    match value {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
            Some(map)
        }
        _ => None,
    }
}

fn op_matches(actual: Option<&Value>, op: &str, operand: &Value) -> bool {
    let resolved = actual.unwrap_or(&Value::Null);
    match op {
        "$eq" => loose_eq(resolved, operand),
        "$ne" => !loose_eq(resolved, operand),
        "$lt" => compare(resolved, operand) == Some(Ordering::Less),
        "$lte" => matches!(
            compare(resolved, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "$gt" => compare(resolved, operand) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare(resolved, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$in" => operand
            .as_array()
            .is_some_and(|list| list.iter().any(|el| loose_eq(resolved, el))),
        "$nin" => operand
            .as_array()
            .is_some_and(|list| !list.iter().any(|el| loose_eq(resolved, el))),
        "$exists" => operand
            .as_bool()
            .is_some_and(|wanted| actual.is_some() == wanted),
        "$regex" => regex_matches(resolved, operand),
        "$all" => match (resolved.as_array(), operand.as_array()) {
            (Some(haystack), Some(needles)) => needles
                .iter()
                .all(|needle| haystack.iter().any(|el| loose_eq(el, needle))),
            _ => false,
        },
        other => {
            warn!(operator = other, "unrecognized condition operator");
            false
        }
    }
}

fn regex_matches(actual: &Value, pattern: &Value) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_str(), pattern.as_str()) else {
        return false;
    };
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(err) => {
            warn!(pattern, error = %err, "invalid regex in condition");
            false
        }
    }
}

/// Equality with number coercion, instant-equality for timestamp strings,
/// and array-contains semantics when a scalar is expected of an array.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(items), other) if !other.is_array() => {
            items.iter().any(|el| loose_eq(el, other))
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        _ => None,
    }
}

fn parse_instant(text: &str) -> Option<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}
