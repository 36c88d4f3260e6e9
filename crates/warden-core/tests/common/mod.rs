//! Helper utilities for integration tests

use std::collections::HashMap;

use serde_json::Value;
use warden_core::{Ability, HelperMap, Materializer, Rule};

/// Test fixture wrapping an ability with assertion helpers.
pub struct TestFixture {
    pub ability: Ability,
}

impl TestFixture {
    /// Build an ability for the given rules and context, with no helpers
    /// and lenient template resolution.
    pub fn new(subject: &str, action: &str, rules: Vec<Rule>, context: Value) -> Self {
        Self::with_helpers(subject, action, rules, context, HashMap::new())
    }

    pub fn with_helpers(
        subject: &str,
        action: &str,
        rules: Vec<Rule>,
        context: Value,
        helpers: HelperMap,
    ) -> Self {
        let ability = Ability::new(
            subject,
            action,
            rules,
            context,
            helpers,
            Materializer::default(),
        )
        .expect("fixture rules materialize");

        Self { ability }
    }

    pub fn assert_allowed(&self, action: &str, instance: &Value, field: Option<&str>) {
        assert!(
            self.ability.can(action, instance, field),
            "{action} should be allowed on {instance} (field: {field:?})"
        );
    }

    pub fn assert_denied(&self, action: &str, instance: &Value, field: Option<&str>) {
        assert!(
            !self.ability.can(action, instance, field),
            "{action} should be denied on {instance} (field: {field:?})"
        );
    }
}
