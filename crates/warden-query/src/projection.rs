//! The caller's requested projection
//!
//! The wire format distinguishes "no fields object", "empty fields
//! object", "relation key absent", and "relation key mapped to null" -
//! every one of them meaning "all fields" at its own level. Modeling the
//! per-relation state as a closed enum keeps that table exhaustive
//! instead of scattering null checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field selection for one relation key (or `"target"` for the primary
/// entity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    /// Select every field; nothing may be added on the relation's behalf.
    All,
    /// Select exactly these fields.
    Explicit(Vec<String>),
}

impl FieldSelection {
    pub fn explicit(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        FieldSelection::Explicit(fields.into_iter().map(Into::into).collect())
    }

    pub fn as_explicit(&self) -> Option<&[String]> {
        match self {
            FieldSelection::All => None,
            FieldSelection::Explicit(fields) => Some(fields),
        }
    }
}

impl Serialize for FieldSelection {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldSelection::All => serializer.serialize_none(),
            FieldSelection::Explicit(fields) => fields.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldSelection {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Option::<Vec<String>>::deserialize(deserializer)?;
        Ok(match fields {
            None => FieldSelection::All,
            Some(fields) => FieldSelection::Explicit(fields),
        })
    }
}

/// The caller's projection: which fields per relation, and which
/// relations to expose. `fields: None` and an empty map both mean "all
/// fields everywhere"; a relation key missing from the map means "all
/// fields for that relation".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldSelection>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

impl QuerySpec {
    /// A query selecting everything and exposing no relations.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_fields(
        mut self,
        relation: impl Into<String>,
        selection: FieldSelection,
    ) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(relation.into(), selection);
        self
    }

    pub fn with_include(mut self, relation: impl Into<String>) -> Self {
        self.include.push(relation.into());
        self
    }

    /// The selection in force for a relation key, honoring both the
    /// missing-map and missing-key spellings of "everything".
    pub fn selection(&self, relation: &str) -> &FieldSelection {
        const ALL: &FieldSelection = &FieldSelection::All;
        match &self.fields {
            Some(map) => map.get(relation).unwrap_or(ALL),
            None => ALL,
        }
    }
}
