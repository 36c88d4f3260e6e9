//! Sample entities and metadata

use serde_json::{json, Value};
use uuid::Uuid;
use warden_schema::{EntityMetadata, MetadataRegistry};

/// Metadata for the User / Profile / Article / Comment test universe.
pub fn article_registry() -> MetadataRegistry {
    MetadataRegistry::new()
        .with(
            EntityMetadata::new("User", ["id", "login", "role", "email"], "id")
                .with_relation("profile", "Profile")
                .with_relation("comments", "Comment"),
        )
        .with(EntityMetadata::new(
            "Profile",
            ["id", "phone", "isPublic"],
            "id",
        ))
        .with(
            EntityMetadata::new(
                "Article",
                ["id", "title", "body", "authorId", "published"],
                "id",
            )
            .with_relation("author", "User"),
        )
        .with(
            EntityMetadata::new("Comment", ["id", "text", "score"], "id")
                .with_relation("author", "User"),
        )
}

/// A user row without relations loaded.
pub fn user(id: i64, login: &str, role: &str) -> Value {
    json!({
        "id": id,
        "login": login,
        "role": role,
        "email": format!("{login}@example.test"),
    })
}

/// A user row with its profile relation loaded.
pub fn user_with_profile(id: i64, login: &str, phone: &str, is_public: bool) -> Value {
    let mut row = user(id, login, "member");
    row["profile"] = json!({
        "id": id * 100,
        "phone": phone,
        "isPublic": is_public,
    });
    row
}

/// An article row owned by `author_id`. Ids are random so rows from
/// repeated calls never collide.
pub fn article(title: &str, author_id: i64, published: bool) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": title,
        "body": format!("body of {title}"),
        "authorId": author_id,
        "published": published,
    })
}
