//! Request-scoped permission set for one (subject, action) pair

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::compile::compile_rules;
use crate::template::{self, Materializer};
use crate::types::{HelperMap, Rule};
use crate::{matcher, CoreError, Result};

/// The extra fields, relations, and conditions a query needs so the store
/// can evaluate an ability's rules against data the caller did not ask for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AclQueryData {
    /// Fields per relation (or `"target"`) the conditions touch.
    pub fields: Option<BTreeMap<String, Vec<String>>>,
    /// Relations the conditions require to be joined.
    pub include: Option<Vec<String>>,
    /// Store-executable filter, absent when no rule restricts rows.
    pub rules_for_query: Option<Value>,
}

/// The evaluated permission set for one (subject, action) pair.
///
/// Built once per request after rules are loaded and materialized;
/// consumed by exactly one request's handler chain. The only mutation is
/// [`Ability::update_with_input`], a single linear swap of the rule set.
pub struct Ability {
    subject: String,
    action: String,
    template_rules: Vec<Rule>,
    rules: Vec<Rule>,
    context: Value,
    helpers: HelperMap,
    materializer: Materializer,
    has_conditions: bool,
    has_fields: bool,
}

impl Ability {
    /// Materialize `template_rules` against `context` and bind the result
    /// to the (subject, action) pair.
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        template_rules: Vec<Rule>,
        context: Value,
        helpers: HelperMap,
        materializer: Materializer,
    ) -> Result<Self> {
        let subject = subject.into();
        let action = action.into();

        for rule in &template_rules {
            if rule.subject.trim().is_empty() {
                return Err(CoreError::MalformedSubject(rule.subject.clone()));
            }
        }

        let rules = materializer.materialize(&template_rules, &context, &helpers, None)?;
        let (has_conditions, has_fields) = derive_flags(&rules);

        debug!(
            subject = %subject,
            action = %action,
            rule_count = rules.len(),
            has_conditions,
            has_fields,
            "ability constructed"
        );

        Ok(Self {
            subject,
            action,
            template_rules,
            rules,
            context,
            helpers,
            materializer,
            has_conditions,
            has_fields,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// The live, materialized rule set.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The original template rules, before materialization.
    pub fn template_rules(&self) -> &[Rule] {
        &self.template_rules
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// True iff any rule carries row-level conditions.
    pub fn has_conditions(&self) -> bool {
        self.has_conditions
    }

    /// True iff any rule restricts fields.
    pub fn has_fields(&self) -> bool {
        self.has_fields
    }

    /// Whether `action` may run on `instance`, optionally narrowed to one
    /// field. Among the rules whose conditions hold, the last one in
    /// declaration order wins; inverted rules subtract permission.
    pub fn can(&self, action: &str, instance: &Value, field: Option<&str>) -> bool {
        let mut winner: Option<&Rule> = None;

        for rule in &self.rules {
            if rule.action != action {
                continue;
            }
            if let Some(field) = field {
                if let Some(fields) = &rule.fields {
                    if !fields.is_empty() && !fields.iter().any(|f| f == field) {
                        continue;
                    }
                }
            }
            let conditions_hold = match &rule.conditions {
                Some(conditions) if !conditions.is_empty() => {
                    matcher::matches(conditions, instance)
                }
                _ => true,
            };
            if conditions_hold {
                winner = Some(rule);
            }
        }

        winner.map(|rule| !rule.inverted).unwrap_or(false)
    }

    /// Like [`Ability::can`], but yields the denial error callers map to a
    /// client-facing "forbidden" response.
    pub fn ensure_can(&self, action: &str, instance: &Value, field: Option<&str>) -> Result<()> {
        if self.can(action, instance, field) {
            Ok(())
        } else {
            Err(CoreError::AuthorizationDenied)
        }
    }

    /// Re-materialize the input-dependent subset of rules once the entity
    /// under evaluation is known. Rules without `@input` references keep
    /// their original materialization.
    #[instrument(skip(self, input), fields(subject = %self.subject, action = %self.action))]
    pub fn update_with_input(&mut self, input: &Value) -> Result<()> {
        let mut replacements = Vec::new();
        for (index, template_rule) in self.template_rules.iter().enumerate() {
            if template::references_input(template_rule) {
                let rule = self.materializer.materialize_rule(
                    template_rule,
                    &self.context,
                    &self.helpers,
                    Some(input),
                )?;
                replacements.push((index, rule));
            }
        }

        // Commit only after the whole subset materialized.
        let replaced = replacements.len();
        for (index, rule) in replacements {
            self.rules[index] = rule;
        }
        let (has_conditions, has_fields) = derive_flags(&self.rules);
        self.has_conditions = has_conditions;
        self.has_fields = has_fields;

        debug!(replaced, "ability refreshed with request input");
        Ok(())
    }

    /// Compile the ability's condition-bearing rules into a reusable store
    /// filter plus the fields/relations that filter needs loaded.
    #[instrument(skip(self), fields(subject = %self.subject, action = %self.action))]
    pub fn get_query_object(&self) -> Result<AclQueryData> {
        let relevant = self
            .rules
            .iter()
            .filter(|rule| rule.action == self.action && rule.subject == self.subject);
        let compiled = compile_rules(relevant)?;

        debug!(
            touched_relations = compiled.include.len(),
            restricted = compiled.filter.is_some(),
            "compiled ability into query filter"
        );

        Ok(AclQueryData {
            fields: if compiled.fields.is_empty() {
                None
            } else {
                Some(compiled.fields)
            },
            include: if compiled.include.is_empty() {
                None
            } else {
                Some(compiled.include)
            },
            rules_for_query: compiled.filter,
        })
    }
}

fn derive_flags(rules: &[Rule]) -> (bool, bool) {
    let has_conditions = rules.iter().any(Rule::has_conditions);
    let has_fields = rules.iter().any(Rule::has_fields);
    (has_conditions, has_fields)
}
