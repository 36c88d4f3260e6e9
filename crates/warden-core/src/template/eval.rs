//! Placeholder evaluation against a typed scope

use serde_json::Value;
use tracing::warn;

use super::ast::{Arg, Expr, PathRoot, PathSegment, PropertyPath, Segment, Template};
use crate::types::HelperMap;
use crate::{CoreError, Result};

/// The values a template evaluates against: the request context, the
/// optional write input, and the helper functions.
pub struct Scope<'a> {
    pub context: &'a Value,
    pub input: Option<&'a Value>,
    pub helpers: &'a HelperMap,
}

/// Evaluate a parsed template to its substituted value.
///
/// A template that is a single placeholder yields the resolved value's
/// native JSON type; placeholders embedded in longer text splice in their
/// string rendering instead.
pub fn evaluate(template: &Template, scope: &Scope<'_>, strict: bool) -> Result<Value> {
    if let Some(expr) = template.as_single_placeholder() {
        return evaluate_expr(expr, scope, strict);
    }

    let mut out = String::new();
    for segment in &template.segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(expr) => {
                let value = evaluate_expr(expr, scope, strict)?;
                out.push_str(&render_inline(&value));
            }
        }
    }
    Ok(Value::String(out))
}

fn evaluate_expr(expr: &Expr, scope: &Scope<'_>, strict: bool) -> Result<Value> {
    match expr {
        Expr::Path(path) => resolve_path(path, scope, strict),
        Expr::Call(call) => {
            let helper = scope.helpers.get(&call.name).ok_or_else(|| {
                CoreError::HelperFailed {
                    name: call.name.clone(),
                    message: "unknown helper".to_string(),
                }
            })?;

            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(match arg {
                    Arg::Literal(text) => Value::String(text.clone()),
                    Arg::Path(path) => resolve_path(path, scope, strict)?,
                });
            }

            helper(&args).map_err(|message| CoreError::HelperFailed {
                name: call.name.clone(),
                message,
            })
        }
    }
}

fn resolve_path(path: &PropertyPath, scope: &Scope<'_>, strict: bool) -> Result<Value> {
    let root = match path.root {
        PathRoot::Context => Some(scope.context),
        PathRoot::Input => scope.input,
    };

    let mut current = match root {
        Some(value) => value,
        None => return unresolved(path, strict),
    };

    for segment in &path.segments {
        let next = match segment {
            PathSegment::Key(key) => current.get(key.as_str()),
            PathSegment::Index(index) => current.get(index),
        };
        match next {
            Some(value) => current = value,
            None => return unresolved(path, strict),
        }
    }

    Ok(current.clone())
}

fn unresolved(path: &PropertyPath, strict: bool) -> Result<Value> {
    if strict {
        Err(CoreError::TemplateResolution {
            path: path.dotted(),
        })
    } else {
        warn!(path = %path.dotted(), "template variable not found, substituting null");
        Ok(Value::Null)
    }
}

/// Render a value for splicing into the middle of a string template.
///
/// Strings splice their content verbatim; arrays and objects splice their
/// compact JSON text. Escaping stays inside the value representation, so
/// quotes and backslashes in user strings survive the round trip.
fn render_inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
        }
    }
}
