//! Core types for authorization rules

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A condition tree: field-path keys mapped to literal values or operator
/// maps, with `$or`/`$and`/`$nor`/`$not` combinators at any level.
pub type ConditionMap = serde_json::Map<String, Value>;

/// Boolean combinator keys recognized inside condition trees.
pub const COMBINATORS: [&str; 4] = ["$or", "$and", "$nor", "$not"];

/// Key under which the primary entity's own fields are recorded in field
/// maps, as opposed to relation names.
pub const TARGET_KEY: &str = "target";

/// Reserved input sub-key holding the pre-change entity for update actions.
pub const CURRENT_KEY: &str = "__current";

/// A declarative permission statement: can (or cannot, when `inverted`)
/// perform `action` on `subject` when `conditions` hold, restricted to
/// `fields` if present. Immutable once materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: String,
    pub subject: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inverted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Rule {
    pub fn new(action: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
            conditions: None,
            fields: None,
            inverted: false,
            reason: None,
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionMap) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Whether this rule restricts which fields the action may touch.
    pub fn has_fields(&self) -> bool {
        self.fields.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Whether this rule carries row-level conditions.
    pub fn has_conditions(&self) -> bool {
        self.conditions.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A pure function invocable from inside `${...}` template expressions.
pub type Helper = Arc<dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync>;

/// Named helper functions available to rule templates.
pub type HelperMap = HashMap<String, Helper>;

/// Wrap a plain closure as a [`Helper`].
pub fn helper<F>(f: F) -> Helper
where
    F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Render a datetime as the ISO-8601 string used for scope values.
///
/// A datetime placed into context or input must compare equal, after
/// substitution, to this rendering.
pub fn datetime_value(dt: &DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
