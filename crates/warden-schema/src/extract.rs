//! Field-path extraction over loaded entity graphs

use serde_json::Value;

use crate::metadata::MetadataRegistry;
use crate::Result;

/// Dot-paths of every present, non-null, non-primary-key property of the
/// instance, descending into loaded relations. A relation loaded as an
/// array contributes paths from its first element; absent, null, and
/// empty relations are skipped.
pub fn fields(instance: &Value, entity_type: &str, registry: &MetadataRegistry) -> Result<Vec<String>> {
    let mut out = Vec::new();
    collect(instance, entity_type, registry, None, &mut out)?;
    Ok(out)
}

fn collect(
    instance: &Value,
    entity_type: &str,
    registry: &MetadataRegistry,
    prefix: Option<&str>,
    out: &mut Vec<String>,
) -> Result<()> {
    let metadata = registry.get(entity_type)?;
    let Some(map) = instance.as_object() else {
        return Ok(());
    };

    for property in &metadata.properties {
        if property == &metadata.primary_key {
            continue;
        }
        if map.get(property).is_some_and(|v| !v.is_null()) {
            out.push(join(prefix, property));
        }
    }

    for relation in &metadata.relations {
        let Some(value) = map.get(relation) else {
            continue;
        };
        // The first element of a loaded collection stands in for the rest.
        let representative = match value {
            Value::Object(_) => Some(value),
            Value::Array(items) => items.first(),
            _ => None,
        };
        let Some(representative) = representative else {
            continue;
        };
        if representative.is_null() {
            continue;
        }

        let target = metadata.relation_target(relation)?;
        let nested_prefix = join(prefix, relation);
        collect(representative, target, registry, Some(&nested_prefix), out)?;
    }

    Ok(())
}

/// Flat snapshot of the instance's non-key scalar attributes: depth zero,
/// relations excluded. Used as the comparison baseline for updates.
pub fn props(
    instance: &Value,
    entity_type: &str,
    registry: &MetadataRegistry,
) -> Result<serde_json::Map<String, Value>> {
    let metadata = registry.get(entity_type)?;
    let mut out = serde_json::Map::new();

    if let Some(map) = instance.as_object() {
        for property in &metadata.properties {
            if property == &metadata.primary_key {
                continue;
            }
            if let Some(value) = map.get(property) {
                if !value.is_null() {
                    out.insert(property.clone(), value.clone());
                }
            }
        }
    }

    Ok(out)
}

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityMetadata;
    use crate::SchemaError;
    use serde_json::json;

    fn registry() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(
                EntityMetadata::new("User", ["id", "login", "age"], "id")
                    .with_relation("profile", "Profile")
                    .with_relation("comments", "Comment"),
            )
            .with(EntityMetadata::new("Profile", ["id", "phone", "bio"], "id"))
            .with(
                EntityMetadata::new("Comment", ["id", "text"], "id")
                    .with_relation("author", "User"),
            )
    }

    #[test]
    fn test_extracts_non_key_fields_and_relation_paths() {
        let user = json!({"id": 1, "login": "x", "profile": {"id": 10, "phone": "y"}});
        let paths = fields(&user, "User", &registry()).unwrap();

        assert_eq!(paths, vec!["login", "profile.phone"]);
    }

    #[test]
    fn test_skips_absent_and_null_values() {
        let user = json!({"id": 1, "login": "x", "age": null, "profile": null});
        let paths = fields(&user, "User", &registry()).unwrap();

        assert_eq!(paths, vec!["login"]);
    }

    #[test]
    fn test_array_relation_uses_first_element() {
        let user = json!({
            "id": 1,
            "login": "x",
            "comments": [{"id": 5, "text": "hello"}, {"id": 6}],
        });
        let paths = fields(&user, "User", &registry()).unwrap();

        assert_eq!(paths, vec!["login", "comments.text"]);
    }

    #[test]
    fn test_empty_array_relation_skipped() {
        let user = json!({"id": 1, "login": "x", "comments": []});
        let paths = fields(&user, "User", &registry()).unwrap();

        assert_eq!(paths, vec!["login"]);
    }

    #[test]
    fn test_nested_relations_recurse() {
        let user = json!({
            "id": 1,
            "comments": [{"id": 5, "text": "t", "author": {"id": 2, "login": "deep"}}],
        });
        let paths = fields(&user, "User", &registry()).unwrap();

        assert_eq!(paths, vec!["comments.text", "comments.author.login"]);
    }

    #[test]
    fn test_missing_metadata_is_hard_error() {
        let result = fields(&json!({"id": 1}), "Ghost", &registry());
        assert!(matches!(
            result,
            Err(SchemaError::EntityMetadataNotFound { .. })
        ));
    }

    #[test]
    fn test_props_flat_snapshot() {
        let user = json!({
            "id": 1,
            "login": "x",
            "age": 30,
            "profile": {"id": 10, "phone": "y"},
        });
        let snapshot = props(&user, "User", &registry()).unwrap();

        assert_eq!(
            serde_json::Value::Object(snapshot),
            json!({"login": "x", "age": 30})
        );
    }
}
