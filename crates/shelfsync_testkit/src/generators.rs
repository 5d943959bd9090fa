//! Property-based test generators using proptest.
//!
//! Collections produced here never contain two records with the same id,
//! matching what a well-behaved client stores.

use proptest::prelude::*;
use shelfsync_codec::{Category, Record};
use std::ops::Range;

/// Strategy for generating record ids.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,12}").expect("Invalid regex")
}

/// Strategy for generating categories.
pub fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

/// Strategy for free text, including multi-byte and astral characters.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[ -~]{0,80}").expect("Invalid regex"),
        prop::string::string_regex("[a-zé€日本語😀 ]{0,40}").expect("Invalid regex"),
        any::<String>(),
    ]
}

/// Strategy for generating a single record.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (
        id_strategy(),
        text_strategy(),
        text_strategy(),
        prop::collection::vec(
            prop::string::string_regex("[a-z]{1,8}").expect("Invalid regex"),
            0..4,
        ),
        category_strategy(),
        0i64..4_000_000_000_000,
    )
        .prop_map(|(id, title, text, tags, category, updated_at)| Record {
            id,
            title,
            text,
            tags,
            category,
            updated_at,
        })
}

/// Strategy for a collection with unique ids.
pub fn collection_strategy(size: Range<usize>) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_map(id_strategy(), record_strategy(), size).prop_map(|by_id| {
        by_id
            .into_iter()
            .map(|(id, record)| Record { id, ..record })
            .collect()
    })
}

/// Strategy for two collections that share no id.
pub fn disjoint_collections_strategy(
    size: Range<usize>,
) -> impl Strategy<Value = (Vec<Record>, Vec<Record>)> {
    let tag = |prefix: &'static str| {
        move |records: Vec<Record>| {
            records
                .into_iter()
                .map(|r| Record {
                    id: format!("{prefix}{}", r.id),
                    ..r
                })
                .collect::<Vec<_>>()
        }
    };
    (
        collection_strategy(size.clone()).prop_map(tag("l-")),
        collection_strategy(size).prop_map(tag("r-")),
    )
}

/// Strategy for two collections sharing every id with differing contents.
pub fn overlapping_collections_strategy(
    size: Range<usize>,
) -> impl Strategy<Value = (Vec<Record>, Vec<Record>)> {
    collection_strategy(size)
        .prop_flat_map(|local| {
            let n = local.len();
            (
                Just(local),
                prop::collection::vec((text_strategy(), 0i64..4_000_000_000_000), n),
            )
        })
        .prop_map(|(local, edits)| {
            let remote = local
                .iter()
                .zip(edits)
                .map(|(r, (text, updated_at))| Record {
                    text,
                    updated_at,
                    ..r.clone()
                })
                .collect();
            (local, remote)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn collections_have_unique_ids(c in collection_strategy(0..30)) {
            let ids: HashSet<_> = c.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(ids.len(), c.len());
        }

        #[test]
        fn disjoint_collections_share_nothing((a, b) in disjoint_collections_strategy(0..10)) {
            let ids: HashSet<_> = a.iter().map(|r| r.id.as_str()).collect();
            prop_assert!(b.iter().all(|r| !ids.contains(r.id.as_str())));
        }
    }
}
