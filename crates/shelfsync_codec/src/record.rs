//! Record model.

use crate::clock::now_millis;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Display bucket for a record.
///
/// Unknown strings read from storage map to [`Category::Other`], so a newer
/// client adding a bucket never breaks an older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Pinned by the user.
    Favorite,
    /// Recently used.
    Recent,
    /// Everything else.
    #[default]
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [Category::Favorite, Category::Recent, Category::Other];

    /// Storage name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Favorite => "favorite",
            Category::Recent => "recent",
            Category::Other => "other",
        }
    }

    /// Parses a storage name, returning `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "favorite" => Some(Category::Favorite),
            "recent" => Some(Category::Recent),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Category::parse(&name).unwrap_or_default()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-stored item.
///
/// `id` is the identity key for merging and never changes after creation.
/// `updated_at` must be refreshed on every mutation; it is both the merge
/// tie-breaker and the display sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Opaque unique identifier.
    #[serde(default)]
    pub id: String,
    /// Short display title, may be empty.
    #[serde(default)]
    pub title: String,
    /// Body text. Empty text marks the record as not persistable.
    #[serde(default)]
    pub text: String,
    /// Order-insensitive labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display bucket.
    #[serde(default)]
    pub category: Category,
    /// Milliseconds since the Unix epoch of the last mutation.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub updated_at: i64,
}

impl Record {
    /// Creates a record with a fresh identifier and the current time.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        tags: Vec<String>,
        category: Category,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            text: text.into(),
            tags,
            category,
            updated_at: now_millis(),
        }
    }

    /// Creates a record with an explicit identifier and timestamp.
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        updated_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            tags: Vec::new(),
            category: Category::Other,
            updated_at,
        }
    }

    /// Refreshes `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.touch_at(now_millis());
    }

    /// Sets `updated_at`, never moving it backwards.
    pub fn touch_at(&mut self, millis: i64) {
        self.updated_at = self.updated_at.max(millis);
    }

    /// Returns false for records that must not be stored (empty text).
    pub fn is_persistable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Accepts integer or floating point milliseconds; `null` reads as 0.
fn lenient_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(value
        .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)))
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_fields() {
        let mut record = Record::with_id("a", "Title", "body", 42);
        record.tags = vec!["x".into()];
        record.category = Category::Favorite;

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a",
                "title": "Title",
                "text": "body",
                "tags": ["x"],
                "category": "favorite",
                "updatedAt": 42
            })
        );
    }

    #[test]
    fn missing_fields_default() {
        let record: Record = serde_json::from_value(json!({"id": "a", "text": "t"})).unwrap();
        assert_eq!(record.title, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.category, Category::Other);
        assert_eq!(record.updated_at, 0);
    }

    #[test]
    fn unknown_category_reads_as_other() {
        let record: Record =
            serde_json::from_value(json!({"id": "a", "category": "archived"})).unwrap();
        assert_eq!(record.category, Category::Other);
    }

    #[test]
    fn float_and_null_timestamps() {
        let record: Record =
            serde_json::from_value(json!({"id": "a", "updatedAt": 1700000000000.0})).unwrap();
        assert_eq!(record.updated_at, 1_700_000_000_000);

        let record: Record =
            serde_json::from_value(json!({"id": "a", "updatedAt": null})).unwrap();
        assert_eq!(record.updated_at, 0);
    }

    #[test]
    fn new_records_have_unique_ids() {
        let a = Record::new("", "one", vec![], Category::Other);
        let b = Record::new("", "two", vec![], Category::Other);
        assert_ne!(a.id, b.id);
        assert!(a.updated_at > 0);
    }

    #[test]
    fn touch_never_goes_backwards() {
        let mut record = Record::with_id("a", "", "t", 500);
        record.touch_at(100);
        assert_eq!(record.updated_at, 500);
        record.touch_at(900);
        assert_eq!(record.updated_at, 900);
    }

    #[test]
    fn empty_text_is_not_persistable() {
        assert!(!Record::with_id("a", "title", "  ", 1).is_persistable());
        assert!(Record::with_id("a", "", "x", 1).is_persistable());
    }

    #[test]
    fn category_names_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("nope"), None);
    }
}
