//! Store-vocabulary filter execution over JSON rows

use serde_json::Value;
use tracing::warn;

/// Whether a row satisfies a store filter. Keys at one level combine
/// conjunctively; relation conditions arrive in nested-object form.
pub fn filter_matches(filter: &Value, row: &Value) -> bool {
    let Some(map) = filter.as_object() else {
        warn!("filter root must be an object");
        return false;
    };

    map.iter().all(|(key, expected)| match key.as_str() {
        "$or" => expected
            .as_array()
            .is_some_and(|branches| branches.iter().any(|b| filter_matches(b, row))),
        "$and" => expected
            .as_array()
            .is_some_and(|branches| branches.iter().all(|b| filter_matches(b, row))),
        "$not" => !filter_matches(expected, row),
        field => field_matches(row.get(field), expected),
    })
}

fn field_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Object(map) if map.keys().all(|k| k.starts_with('$')) && !map.is_empty() => {
            map.iter().all(|(op, operand)| op_matches(actual, op, operand))
        }
        // A non-operator object is a nested relation condition.
        Value::Object(_) => match actual {
            Some(value @ Value::Object(_)) => filter_matches(expected, value),
            Some(Value::Array(items)) => items.iter().any(|item| filter_matches(expected, item)),
            _ => false,
        },
        literal => values_equal(actual.unwrap_or(&Value::Null), literal),
    }
}

fn op_matches(actual: Option<&Value>, op: &str, operand: &Value) -> bool {
    let resolved = actual.unwrap_or(&Value::Null);
    match op {
        "$eq" => values_equal(resolved, operand),
        "$ne" => !values_equal(resolved, operand),
        "$lt" => compare(resolved, operand).is_some_and(|o| o.is_lt()),
        "$lte" => compare(resolved, operand).is_some_and(|o| o.is_le()),
        "$gt" => compare(resolved, operand).is_some_and(|o| o.is_gt()),
        "$gte" => compare(resolved, operand).is_some_and(|o| o.is_ge()),
        "$in" => operand
            .as_array()
            .is_some_and(|list| list.iter().any(|el| values_equal(resolved, el))),
        "$nin" => operand
            .as_array()
            .is_some_and(|list| !list.iter().any(|el| values_equal(resolved, el))),
        "$exists" => operand
            .as_bool()
            .is_some_and(|wanted| actual.is_some() == wanted),
        "$re" => match (resolved.as_str(), operand.as_str()) {
            (Some(text), Some(pattern)) => match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(text),
                Err(err) => {
                    warn!(pattern, error = %err, "invalid regex in store filter");
                    false
                }
            },
            _ => false,
        },
        "$contains" => match (resolved.as_array(), operand.as_array()) {
            (Some(haystack), Some(needles)) => needles
                .iter()
                .all(|needle| haystack.iter().any(|el| values_equal(el, needle))),
            _ => false,
        },
        other => {
            warn!(operator = other, "unrecognized store filter operator");
            false
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.as_str().cmp(y.as_str())),
        _ => None,
    }
}
