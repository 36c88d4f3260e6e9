//! Test fixtures for warden integration tests
//!
//! Canonical entity metadata, sample rows, rule templates, and helper
//! functions shared across the crates' test suites.

pub mod entities;
pub mod rules;

pub use entities::{article, article_registry, user, user_with_profile};
pub use rules::{author_only_rules, default_helpers, reader_context};
