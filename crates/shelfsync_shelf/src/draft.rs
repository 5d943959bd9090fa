//! Editor drafts.
//!
//! A draft is a pending record the user has not saved yet, for example a
//! text selection sent to the editor. At most one draft exists.

use serde::{Deserialize, Serialize};
use shelfsync_codec::{Category, Record};

/// Title used when a capture has no words.
pub const UNTITLED: &str = "(untitled)";

/// Number of leading words used as a captured title.
const TITLE_WORDS: usize = 5;

/// A pending, unsaved record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub text: String,
    /// Labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Target category.
    #[serde(default)]
    pub category: Category,
}

impl Draft {
    /// Builds a draft from selected text, titled by its first words.
    pub fn from_selection(selection: &str) -> Self {
        let text = selection.trim();
        Self {
            title: title_from_text(text),
            text: text.to_string(),
            tags: Vec::new(),
            category: Category::Other,
        }
    }

    /// Turns the draft into a new record.
    pub fn into_record(self) -> Record {
        Record::new(
            self.title.trim(),
            self.text.trim(),
            normalize_tags(self.tags),
            self.category,
        )
    }
}

/// First five whitespace-separated words, or [`UNTITLED`].
pub fn title_from_text(text: &str) -> String {
    let title = text
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(',').map(str::to_string))
}

fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_takes_first_five_words() {
        assert_eq!(
            title_from_text("  one two\tthree\nfour five six seven "),
            "one two three four five"
        );
        assert_eq!(title_from_text("short"), "short");
        assert_eq!(title_from_text("   "), UNTITLED);
    }

    #[test]
    fn selection_is_trimmed() {
        let draft = Draft::from_selection("  Explain this query  ");
        assert_eq!(draft.text, "Explain this query");
        assert_eq!(draft.title, "Explain this query");
        assert_eq!(draft.category, Category::Other);
    }

    #[test]
    fn tags_are_split_and_cleaned() {
        assert_eq!(parse_tags(" sql, ,explain ,"), vec!["sql", "explain"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn draft_json_layout() {
        let draft: Draft = serde_json::from_str(r#"{"title":"t","text":"x"}"#).unwrap();
        assert_eq!(draft.category, Category::Other);
        assert!(draft.tags.is_empty());
    }
}
