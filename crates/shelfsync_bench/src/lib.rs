//! Benchmark utilities.

#![warn(missing_docs)]

use shelfsync_codec::{Category, Record};

/// Generate `count` records with bodies of `text_len` characters.
///
/// Every fourth body mixes in multi-byte characters so chunk boundaries
/// land inside them.
pub fn generate_records(count: usize, text_len: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let text: String = if i % 4 == 0 {
                "héllo wörld 日本 ".chars().cycle().take(text_len).collect()
            } else {
                "lorem ipsum dolor ".chars().cycle().take(text_len).collect()
            };
            let mut record =
                Record::with_id(format!("rec-{i:06}"), format!("Title {i}"), text, i as i64);
            record.category = Category::ALL[i % Category::ALL.len()];
            record.tags = vec!["bench".into()];
            record
        })
        .collect()
}

/// Copy of `records` where every other one is newer and edited.
pub fn diverged_copy(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut r = r.clone();
            if i % 2 == 0 {
                r.text.push_str(" (edited)");
                r.updated_at += 1_000;
            }
            r
        })
        .collect()
}
