//! # Warden Core - Authorization Rule Engine
//!
//! Rule materialization, ability evaluation, and query-filter compilation
//! for attribute- and field-level authorization over a CRUD resource API.

use thiserror::Error;

pub mod ability;
pub mod compile;
pub mod matcher;
pub mod operators;
pub mod template;
pub mod types;
pub mod validate;

pub use ability::{Ability, AclQueryData};
pub use template::Materializer;
pub use types::*;
pub use validate::{validate_no_current_in_rules, validate_rules_for_orm};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Undefined template variable: '{path}'")]
    TemplateResolution { path: String },

    #[error("Template parse error in '{template}': {message}")]
    TemplateParse { template: String, message: String },

    #[error("Helper '{name}' failed: {message}")]
    HelperFailed { name: String, message: String },

    #[error("Unsupported operator: {operator}")]
    UnsupportedOperator { operator: String },

    #[error("Rule references __current outside an update action: {action}")]
    InvalidCurrentReference { action: String },

    #[error("Malformed rule subject: {0:?}")]
    MalformedSubject(String),

    #[error("Invalid condition shape: {0}")]
    InvalidCondition(String),

    #[error("Permission denied")]
    AuthorizationDenied,
}

impl CoreError {
    /// Whether this error is expected in normal traffic and safe to map to
    /// a client-facing "forbidden" without further detail. Everything else
    /// is a configuration or data-shape defect.
    pub fn is_denial(&self) -> bool {
        matches!(self, CoreError::AuthorizationDenied)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
