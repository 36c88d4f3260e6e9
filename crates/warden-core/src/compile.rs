//! Compilation of materialized rules into store query filters
//!
//! Walks every condition leaf to collect the fields and relations the
//! filter touches, translates operators into the store vocabulary, and
//! regroups dotted relation paths into the nested-object shape the store's
//! query layer expects.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::types::{ConditionMap, Rule, TARGET_KEY};
use crate::{operators, CoreError, Result};

/// The outcome of compiling a rule set: the filter itself plus the
/// fields/relations a query must load for the store to evaluate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledRules {
    /// Touched fields keyed by `"target"` or relation name.
    pub fields: BTreeMap<String, Vec<String>>,
    /// Relations the filter requires to be joined, in first-touch order.
    pub include: Vec<String>,
    /// The store-executable filter, or `None` when no rule restricts rows.
    pub filter: Option<Value>,
}

/// Compile every condition-bearing rule into one filter. Non-inverted
/// rules combine under `$or` (any matching rule grants the row);
/// row-subtracting inverted rules join as `$not` branches conjoined with
/// the rest, while field-scoped inverted rules contribute only their
/// touched fields.
pub fn compile_rules<'a, I>(rules: I) -> Result<CompiledRules>
where
    I: IntoIterator<Item = &'a Rule>,
{
    let mut fields = BTreeMap::new();
    let mut include = Vec::new();
    let mut allow = Vec::new();
    let mut deny = Vec::new();

    for rule in rules {
        let Some(conditions) = &rule.conditions else {
            continue;
        };
        if conditions.is_empty() {
            continue;
        }

        let compiled = compile_conditions(conditions, &mut fields, &mut include)?;
        if rule.inverted {
            // A field-scoped inverted rule subtracts field access, not
            // rows; its conditions are evaluated per item after the
            // fetch, so only its touched fields are recorded here.
            if !rule.has_fields() {
                deny.push(json!({ "$not": compiled }));
            }
        } else {
            allow.push(Value::Object(compiled));
        }
    }

    let filter = match (allow.is_empty(), deny.is_empty()) {
        (true, true) => None,
        (false, true) => Some(json!({ "$or": allow })),
        (true, false) => Some(json!({ "$and": deny })),
        (false, false) => {
            let mut branches = vec![json!({ "$or": allow })];
            branches.extend(deny);
            Some(json!({ "$and": branches }))
        }
    };

    Ok(CompiledRules {
        fields,
        include,
        filter,
    })
}

fn compile_conditions(
    conditions: &ConditionMap,
    fields: &mut BTreeMap<String, Vec<String>>,
    include: &mut Vec<String>,
) -> Result<ConditionMap> {
    let mut out = ConditionMap::new();

    for (key, value) in conditions {
        match key.as_str() {
            "$or" | "$and" => {
                let branches = compile_branches(key, value, fields, include)?;
                insert_entry(&mut out, key, Value::Array(branches));
            }
            "$nor" => {
                // The store has no $nor; rewrite as a negated union.
                let branches = compile_branches(key, value, fields, include)?;
                insert_entry(&mut out, "$not", json!({ "$or": branches }));
            }
            "$not" => {
                let inner = value.as_object().ok_or_else(|| {
                    CoreError::InvalidCondition("$not expects a condition object".to_string())
                })?;
                let compiled = compile_conditions(inner, fields, include)?;
                insert_entry(&mut out, "$not", Value::Object(compiled));
            }
            path => {
                record_path(path, fields, include);
                let translated = translate_leaf(value);
                insert_path(&mut out, path, translated);
            }
        }
    }

    Ok(out)
}

fn compile_branches(
    combinator: &str,
    value: &Value,
    fields: &mut BTreeMap<String, Vec<String>>,
    include: &mut Vec<String>,
) -> Result<Vec<Value>> {
    let items = value.as_array().ok_or_else(|| {
        CoreError::InvalidCondition(format!("{combinator} expects an array of conditions"))
    })?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let map = item.as_object().ok_or_else(|| {
            CoreError::InvalidCondition(format!("{combinator} branches must be objects"))
        })?;
        out.push(Value::Object(compile_conditions(map, fields, include)?));
    }
    Ok(out)
}

/// A bare leaf name is a field of the primary entity; a dotted name is a
/// relation plus a relation-local field, and requires the relation to be
/// joined.
fn record_path(path: &str, fields: &mut BTreeMap<String, Vec<String>>, include: &mut Vec<String>) {
    match path.split_once('.') {
        None => push_unique(fields.entry(TARGET_KEY.to_string()).or_default(), path),
        Some((relation, field)) => {
            push_unique(include, relation);
            push_unique(fields.entry(relation.to_string()).or_default(), field);
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Translate operator maps into the store vocabulary; literals pass
/// through untouched.
fn translate_leaf(value: &Value) -> Value {
    match value {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
            Value::Object(
                map.iter()
                    .map(|(op, operand)| (operators::translate(op).to_string(), operand.clone()))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}

/// Regroup a dotted path into nested-object form and merge it into the
/// compiled tree: `{"profile.isPublic": v}` becomes `{profile: {isPublic: v}}`.
fn insert_path(out: &mut ConditionMap, path: &str, value: Value) {
    let mut nested = value;
    let segments: Vec<&str> = path.split('.').collect();
    for segment in segments[1..].iter().rev() {
        let mut wrapper = ConditionMap::new();
        wrapper.insert(segment.to_string(), nested);
        nested = Value::Object(wrapper);
    }
    insert_entry(out, segments[0], nested);
}

/// Merge an entry into the tree. Plain keys deep-merge object values
/// (conjunction over distinct sub-fields); a collision that cannot merge,
/// and any `$`-key collision, folds both entries into an `$and` list so
/// neither condition is lost.
fn insert_entry(out: &mut ConditionMap, key: &str, value: Value) {
    if !out.contains_key(key) {
        out.insert(key.to_string(), value);
        return;
    }

    let mergeable = !key.starts_with('$')
        && matches!(out.get(key), Some(Value::Object(_)))
        && value.is_object();
    if mergeable {
        if let (Some(Value::Object(existing)), Value::Object(incoming)) =
            (out.get_mut(key), value)
        {
            for (k, v) in incoming {
                insert_entry(existing, &k, v);
            }
        }
        return;
    }

    let previous = out.remove(key).unwrap_or(Value::Null);
    let mut branches = match out.remove("$and") {
        Some(Value::Array(existing)) => existing,
        Some(other) => vec![other],
        None => Vec::new(),
    };
    branches.push(json!({ key: previous }));
    branches.push(json!({ key: value }));
    out.insert("$and".to_string(), Value::Array(branches));
}
