//! Rule template materialization
//!
//! Turns declarative template rules into concrete rules by resolving
//! `${...}` placeholders against the request context, helper functions,
//! and optional write input.

pub mod ast;
pub mod eval;
pub mod parser;

use serde_json::Value;
use tracing::debug;

use crate::types::{HelperMap, Rule};
use crate::Result;

pub use eval::Scope;

/// Resolves rule templates into concrete rules.
///
/// Strictness is fixed at construction: in strict mode an undefined
/// context or input path aborts materialization; otherwise it degrades to
/// `null` with a logged warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct Materializer {
    strict: bool,
}

impl Materializer {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Materialize a rule set. Any failure aborts the whole call; no
    /// partially substituted rules are ever returned.
    pub fn materialize(
        &self,
        rules: &[Rule],
        context: &Value,
        helpers: &HelperMap,
        input: Option<&Value>,
    ) -> Result<Vec<Rule>> {
        let scope = Scope {
            context,
            input,
            helpers,
        };

        let mut out = Vec::with_capacity(rules.len());
        for rule in rules {
            match self.materialize_with_scope(rule, &scope) {
                Ok(rule) => out.push(rule),
                Err(err) => {
                    debug!(
                        context_keys = ?object_keys(context),
                        input_keys = ?input.map(object_keys),
                        helper_names = ?helpers.keys().collect::<Vec<_>>(),
                        "rule materialization failed"
                    );
                    return Err(err);
                }
            }
        }
        Ok(out)
    }

    /// Materialize a single rule.
    pub fn materialize_rule(
        &self,
        rule: &Rule,
        context: &Value,
        helpers: &HelperMap,
        input: Option<&Value>,
    ) -> Result<Rule> {
        let scope = Scope {
            context,
            input,
            helpers,
        };
        self.materialize_with_scope(rule, &scope)
    }

    fn materialize_with_scope(&self, rule: &Rule, scope: &Scope<'_>) -> Result<Rule> {
        let mut value = serde_json::to_value(rule)
            .map_err(|e| crate::CoreError::InvalidCondition(e.to_string()))?;
        self.substitute(&mut value, scope)?;
        serde_json::from_value(value).map_err(|e| {
            crate::CoreError::InvalidCondition(format!(
                "substitution produced an invalid rule: {e}"
            ))
        })
    }

    /// Walk the structured rule form and replace every string leaf that
    /// carries a placeholder. Keys are never interpolated.
    fn substitute(&self, value: &mut Value, scope: &Scope<'_>) -> Result<()> {
        match value {
            Value::String(text) => {
                if parser::contains_placeholder(text) {
                    let template = parser::parse_template(text)?;
                    *value = eval::evaluate(&template, scope, self.strict)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.substitute(item, scope)?;
                }
            }
            Value::Object(map) => {
                for (_, item) in map.iter_mut() {
                    self.substitute(item, scope)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Whether any template leaf of the rule references `@input`.
///
/// Rules without input references materialize once per (subject, action,
/// context) and can be cached; the rest must be re-materialized whenever
/// the input changes.
pub fn references_input(rule: &Rule) -> bool {
    let value = match serde_json::to_value(rule) {
        Ok(value) => value,
        Err(_) => return false,
    };
    value_references_input(&value)
}

fn value_references_input(value: &Value) -> bool {
    match value {
        Value::String(text) => {
            if !parser::contains_placeholder(text) {
                return false;
            }
            match parser::parse_template(text) {
                Ok(template) => template.references_input(),
                // An unparseable template will fail materialization anyway;
                // a raw mention is enough to keep it out of the cacheable set.
                Err(_) => text.contains("@input"),
            }
        }
        Value::Array(items) => items.iter().any(value_references_input),
        Value::Object(map) => map.values().any(value_references_input),
        _ => false,
    }
}

fn object_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}
