//! The shelf: user-facing operations on the local collection.

use crate::draft::Draft;
use crate::error::{ShelfError, ShelfResult};
use crate::seed::sample_records;
use serde_json::{json, Value};
use shelfsync_codec::{now_millis, Category, Record};
use shelfsync_storage::KvStore;
use std::sync::Arc;

/// Default local key of the collection.
pub const COLLECTION_KEY: &str = "prompts";

/// Default local key of the editor draft.
pub const DRAFT_KEY: &str = "draftPrompt";

/// Fields of a record about to be added.
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    /// Title, trimmed on add.
    pub title: String,
    /// Body text, trimmed on add. Must not be empty.
    pub text: String,
    /// Labels.
    pub tags: Vec<String>,
    /// Category.
    pub category: Category,
}

/// Reads and mutates the collection stored in a local store.
///
/// Every mutation rewrites the whole collection under one key and refreshes
/// the touched record's `updated_at`; a sync engine watching the store picks
/// the write up from there. Storage order is preserved, listing order is
/// newest first.
pub struct Shelf<S: ?Sized> {
    store: Arc<S>,
    collection_key: String,
    draft_key: String,
}

impl<S> Shelf<S>
where
    S: KvStore + ?Sized,
{
    /// Creates a shelf over `store` with the standard keys.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            collection_key: COLLECTION_KEY.to_string(),
            draft_key: DRAFT_KEY.to_string(),
        }
    }

    /// Uses a different collection key.
    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }

    /// Gets the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Records in storage order.
    pub async fn records(&self) -> ShelfResult<Vec<Record>> {
        match self.store.get(&self.collection_key).await? {
            Some(value) => serde_json::from_value(value).map_err(ShelfError::malformed),
            None => Ok(Vec::new()),
        }
    }

    /// Records sorted by `updated_at`, newest first.
    pub async fn list(&self) -> ShelfResult<Vec<Record>> {
        let mut records = self.records().await?;
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    /// Listed records matching `query`.
    ///
    /// Matching is a case-insensitive substring test over title, text, the
    /// space-joined tags and the category name. An empty query matches all.
    pub async fn search(&self, query: &str) -> ShelfResult<Vec<Record>> {
        let query = query.trim().to_lowercase();
        let records = self.list().await?;
        if query.is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|r| matches_query(r, &query))
            .collect())
    }

    /// Search results bucketed by category, in display order.
    pub async fn grouped(&self, query: &str) -> ShelfResult<Vec<(Category, Vec<Record>)>> {
        let mut groups: Vec<(Category, Vec<Record>)> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();
        for record in self.search(query).await? {
            if let Some((_, bucket)) = groups.iter_mut().find(|(c, _)| *c == record.category) {
                bucket.push(record);
            }
        }
        Ok(groups)
    }

    /// Finds a record by id.
    pub async fn get(&self, id: &str) -> ShelfResult<Option<Record>> {
        Ok(self.records().await?.into_iter().find(|r| r.id == id))
    }

    /// Appends a new record.
    pub async fn add(&self, new: NewRecord) -> ShelfResult<Record> {
        let record = Draft {
            title: new.title,
            text: new.text,
            tags: new.tags,
            category: new.category,
        }
        .into_record();
        if !record.is_persistable() {
            return Err(ShelfError::EmptyText);
        }

        let mut records = self.records().await?;
        records.push(record.clone());
        self.save(&records).await?;
        tracing::info!(id = %record.id, "added record");
        Ok(record)
    }

    /// Stores selected text as a record titled by its first words.
    pub async fn capture(&self, selection: &str) -> ShelfResult<Record> {
        let draft = Draft::from_selection(selection);
        self.add(NewRecord {
            title: draft.title,
            text: draft.text,
            tags: draft.tags,
            category: draft.category,
        })
        .await
    }

    /// Stores selected text as the editor draft instead of a record.
    pub async fn capture_to_draft(&self, selection: &str) -> ShelfResult<Draft> {
        let draft = Draft::from_selection(selection);
        self.save_draft(&draft).await?;
        Ok(draft)
    }

    /// Moves a record to `category`.
    pub async fn set_category(&self, id: &str, category: Category) -> ShelfResult<Record> {
        self.update(id, |record| record.category = category).await
    }

    /// Favorites a record, or moves a favorite back to other.
    pub async fn toggle_favorite(&self, id: &str) -> ShelfResult<Record> {
        self.update(id, |record| {
            record.category = match record.category {
                Category::Favorite => Category::Other,
                _ => Category::Favorite,
            };
        })
        .await
    }

    /// Marks a record as just used: category recent, moved to the end of
    /// storage order.
    pub async fn mark_used(&self, id: &str) -> ShelfResult<Record> {
        let mut records = self.records().await?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ShelfError::NotFound(id.to_string()))?;

        let mut record = records.remove(pos);
        record.category = Category::Recent;
        record.touch_at(now_millis());
        records.push(record.clone());
        self.save(&records).await?;
        Ok(record)
    }

    /// Removes a record.
    pub async fn delete(&self, id: &str) -> ShelfResult<Record> {
        let mut records = self.records().await?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ShelfError::NotFound(id.to_string()))?;
        let removed = records.remove(pos);
        self.save(&records).await?;
        tracing::info!(id, "deleted record");
        Ok(removed)
    }

    /// Pretty-printed export document `{"prompts": [...]}`.
    pub async fn export(&self) -> ShelfResult<String> {
        let records = self.records().await?;
        serde_json::to_string_pretty(&json!({ "prompts": records }))
            .map_err(|e| ShelfError::Export(e.to_string()))
    }

    /// Replaces the collection with imported records.
    ///
    /// Accepts a bare record array or an export document. Returns the number
    /// of records imported.
    pub async fn import(&self, input: &str) -> ShelfResult<usize> {
        let value: Value = serde_json::from_str(input).map_err(ShelfError::import)?;
        let list = match value {
            Value::Array(_) => value,
            Value::Object(mut map) => match map.remove("prompts") {
                Some(list @ Value::Array(_)) => list,
                _ => return Err(ShelfError::Import("expected a \"prompts\" array".into())),
            },
            _ => return Err(ShelfError::Import("expected an array or object".into())),
        };
        let records: Vec<Record> = serde_json::from_value(list).map_err(ShelfError::import)?;
        self.save(&records).await?;
        tracing::info!(records = records.len(), "imported collection");
        Ok(records.len())
    }

    /// Writes the sample collection if the shelf is empty.
    ///
    /// Returns true if anything was written.
    pub async fn seed_if_empty(&self) -> ShelfResult<bool> {
        if !self.records().await?.is_empty() {
            return Ok(false);
        }
        self.save(&sample_records(now_millis())).await?;
        Ok(true)
    }

    /// Stores the editor draft, replacing any previous one.
    pub async fn save_draft(&self, draft: &Draft) -> ShelfResult<()> {
        let value = serde_json::to_value(draft).map_err(ShelfError::malformed)?;
        self.store.set(&self.draft_key, value).await?;
        Ok(())
    }

    /// Loads the editor draft. An unreadable draft is treated as absent.
    pub async fn load_draft(&self) -> ShelfResult<Option<Draft>> {
        let Some(value) = self.store.get(&self.draft_key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable draft");
                Ok(None)
            }
        }
    }

    /// Discards the editor draft.
    pub async fn clear_draft(&self) -> ShelfResult<()> {
        self.store.remove(&self.draft_key).await?;
        Ok(())
    }

    /// Saves the draft as a record and clears it.
    ///
    /// Returns `None` if there is no draft. A draft without text is kept.
    pub async fn commit_draft(&self) -> ShelfResult<Option<Record>> {
        let Some(draft) = self.load_draft().await? else {
            return Ok(None);
        };
        let record = self
            .add(NewRecord {
                title: draft.title,
                text: draft.text,
                tags: draft.tags,
                category: draft.category,
            })
            .await?;
        self.clear_draft().await?;
        Ok(Some(record))
    }

    async fn update<F>(&self, id: &str, mutate: F) -> ShelfResult<Record>
    where
        F: FnOnce(&mut Record),
    {
        let mut records = self.records().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ShelfError::NotFound(id.to_string()))?;
        mutate(record);
        record.touch_at(now_millis());
        let updated = record.clone();
        self.save(&records).await?;
        Ok(updated)
    }

    async fn save(&self, records: &[Record]) -> ShelfResult<()> {
        let value = serde_json::to_value(records).map_err(ShelfError::malformed)?;
        self.store.set(&self.collection_key, value).await?;
        Ok(())
    }
}

fn matches_query(record: &Record, query: &str) -> bool {
    record.title.to_lowercase().contains(query)
        || record.text.to_lowercase().contains(query)
        || record.tags.join(" ").to_lowercase().contains(query)
        || record.category.as_str().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfsync_storage::InMemoryStore;
    use shelfsync_testkit::{collection_value, rec, rec_in};

    async fn shelf_with(records: &[Record]) -> Shelf<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(COLLECTION_KEY, collection_value(records))
            .await
            .unwrap();
        Shelf::new(store)
    }

    fn new_record(title: &str, text: &str) -> NewRecord {
        NewRecord {
            title: title.into(),
            text: text.into(),
            ..NewRecord::default()
        }
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let shelf = Shelf::new(Arc::new(InMemoryStore::new()));
        assert!(shelf.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_stable() {
        let shelf = shelf_with(&[rec("a", "", 1), rec("b", "", 5), rec("c", "", 5)]).await;
        let ids: Vec<_> = shelf
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn search_covers_every_field() {
        let mut tagged = rec("t", "plain", 1);
        tagged.tags = vec!["SQL".into()];
        let shelf = shelf_with(&[
            Record::with_id("a", "Bug Triage", "x", 3),
            rec("b", "summarize THIS", 2),
            tagged,
            rec_in("f", "y", Category::Favorite, 0),
        ])
        .await;

        let ids = |records: Vec<Record>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(shelf.search("triage").await.unwrap()), vec!["a"]);
        assert_eq!(ids(shelf.search("this").await.unwrap()), vec!["b"]);
        assert_eq!(ids(shelf.search("sql").await.unwrap()), vec!["t"]);
        assert_eq!(ids(shelf.search("favor").await.unwrap()), vec!["f"]);
        assert_eq!(shelf.search("  ").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn grouped_in_display_order() {
        let shelf = shelf_with(&[
            rec_in("o", "x", Category::Other, 1),
            rec_in("f", "x", Category::Favorite, 2),
        ])
        .await;
        let groups = shelf.grouped("").await.unwrap();
        let order: Vec<_> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(groups[0].1[0].id, "f");
        assert!(groups[1].1.is_empty());
        assert_eq!(groups[2].1[0].id, "o");
    }

    #[tokio::test]
    async fn add_trims_and_rejects_empty_text() {
        let shelf = shelf_with(&[]).await;
        let added = shelf.add(new_record("  Title ", "  body  ")).await.unwrap();
        assert_eq!(added.title, "Title");
        assert_eq!(added.text, "body");
        assert!(!added.id.is_empty());

        let err = shelf.add(new_record("t", "   ")).await.unwrap_err();
        assert!(matches!(err, ShelfError::EmptyText));
        assert_eq!(shelf.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn capture_titles_by_first_words() {
        let shelf = shelf_with(&[]).await;
        let record = shelf
            .capture("  please review this pull request carefully ")
            .await
            .unwrap();
        assert_eq!(record.title, "please review this pull request");
        assert_eq!(record.text, "please review this pull request carefully");
        assert_eq!(record.category, Category::Other);
        assert!(shelf.capture("   ").await.is_err());
    }

    #[tokio::test]
    async fn category_changes_refresh_timestamp() {
        let shelf = shelf_with(&[rec("a", "x", 1)]).await;

        let moved = shelf.set_category("a", Category::Recent).await.unwrap();
        assert_eq!(moved.category, Category::Recent);
        assert!(moved.updated_at > 1);

        let fav = shelf.toggle_favorite("a").await.unwrap();
        assert_eq!(fav.category, Category::Favorite);
        let unfav = shelf.toggle_favorite("a").await.unwrap();
        assert_eq!(unfav.category, Category::Other);

        assert!(matches!(
            shelf.toggle_favorite("missing").await.unwrap_err(),
            ShelfError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn mark_used_moves_to_end() {
        let shelf = shelf_with(&[rec("a", "x", 1), rec("b", "y", 2)]).await;
        let used = shelf.mark_used("a").await.unwrap();
        assert_eq!(used.category, Category::Recent);

        let order: Vec<_> = shelf
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let shelf = shelf_with(&[rec("a", "x", 1), rec("b", "y", 2)]).await;
        assert_eq!(shelf.delete("a").await.unwrap().id, "a");
        assert!(shelf.get("a").await.unwrap().is_none());
        assert!(shelf.delete("a").await.is_err());
    }

    #[tokio::test]
    async fn export_then_import_document() {
        let shelf = shelf_with(&[rec("a", "x", 1)]).await;
        let exported = shelf.export().await.unwrap();
        assert!(exported.contains("\n"));
        assert!(exported.starts_with("{\n  \"prompts\""));

        let other = shelf_with(&[rec("z", "gone", 9)]).await;
        assert_eq!(other.import(&exported).await.unwrap(), 1);
        assert_eq!(other.records().await.unwrap(), vec![rec("a", "x", 1)]);
    }

    #[tokio::test]
    async fn import_accepts_bare_array_and_rejects_garbage() {
        let shelf = shelf_with(&[rec("keep", "x", 1)]).await;
        assert_eq!(
            shelf
                .import(r#"[{"id":"n","text":"new","updatedAt":1.5e3}]"#)
                .await
                .unwrap(),
            1
        );
        assert_eq!(shelf.records().await.unwrap()[0].updated_at, 1500);

        assert!(shelf.import("{\"other\": []}").await.is_err());
        assert!(shelf.import("not json").await.is_err());
        assert_eq!(shelf.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn seed_only_when_empty() {
        let shelf = shelf_with(&[]).await;
        assert!(shelf.seed_if_empty().await.unwrap());
        let seeded = shelf.records().await.unwrap();
        assert_eq!(seeded.len(), 3);
        assert_eq!(seeded[0].title, "Bug Triage (Concise)");
        assert!(!shelf.seed_if_empty().await.unwrap());
    }

    #[tokio::test]
    async fn draft_lifecycle() {
        let shelf = shelf_with(&[]).await;
        assert!(shelf.load_draft().await.unwrap().is_none());
        assert!(shelf.commit_draft().await.unwrap().is_none());

        let draft = shelf.capture_to_draft("draft me now").await.unwrap();
        assert_eq!(shelf.load_draft().await.unwrap(), Some(draft));

        let record = shelf.commit_draft().await.unwrap().unwrap();
        assert_eq!(record.text, "draft me now");
        assert!(shelf.load_draft().await.unwrap().is_none());
        assert_eq!(shelf.records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_draft_is_absent() {
        let shelf = shelf_with(&[]).await;
        shelf.store().set(DRAFT_KEY, json!(42)).await.unwrap();
        assert!(shelf.load_draft().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_collection_is_an_error() {
        let store = Arc::new(InMemoryStore::new());
        store.set(COLLECTION_KEY, json!({"not": "a list"})).await.unwrap();
        let shelf = Shelf::new(store);
        assert!(matches!(
            shelf.list().await.unwrap_err(),
            ShelfError::Malformed(_)
        ));
    }
}
