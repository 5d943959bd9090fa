//! Sample records for a fresh install.

use shelfsync_codec::{Category, Record};

/// The starter collection, all stamped with `now`.
pub fn sample_records(now: i64) -> Vec<Record> {
    let sample = |title: &str, text: &str, tags: &[&str], category: Category| {
        let mut record = Record::new(
            title,
            text,
            tags.iter().map(|t| t.to_string()).collect(),
            category,
        );
        record.updated_at = now;
        record
    };

    vec![
        sample(
            "Bug Triage (Concise)",
            "You are a senior developer. Given an issue description, propose: \
             1) likely cause, 2) reproduction steps, 3) minimal test, 4) fix plan.",
            &["dev", "triage", "concise"],
            Category::Favorite,
        ),
        sample(
            "Summarize Meeting",
            "Summarize the transcript into decisions, owners, deadlines, risks, \
             open questions. Be crisp.",
            &["summary", "meetings"],
            Category::Other,
        ),
        sample(
            "SQL Explainer",
            "Explain the following SQL step-by-step, note performance pitfalls, \
             and suggest an index if helpful.",
            &["sql", "explain"],
            Category::Recent,
        ),
    ]
}
