//! Inspect-remote command implementation.

use super::{CommandResult, Profile};
use serde::Serialize;
use shelfsync_codec::{decode_payload, fingerprint, join_chunks};
use shelfsync_storage::{item_size, KvStore};
use shelfsync_sync_engine::REMOTE_ITEM_QUOTA;

/// Remote inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Remote store path.
    pub path: String,
    /// Whether an index was found.
    pub has_index: bool,
    /// Chunk count declared by the index.
    pub chunk_count: usize,
    /// Fingerprint declared by the index.
    pub declared_fingerprint: String,
    /// Fingerprint of the reassembled payload.
    pub actual_fingerprint: String,
    /// Write time declared by the index, in ms.
    pub written_at: i64,
    /// Per-chunk details.
    pub chunks: Vec<ChunkInfo>,
    /// Number of records decoded, if the payload parses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    /// Decode error, if the payload does not parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    /// Chunk keys beyond the declared count.
    pub stale_chunks: Vec<String>,
}

/// Details of one chunk item.
#[derive(Debug, Serialize)]
pub struct ChunkInfo {
    /// Remote key.
    pub key: String,
    /// Whether the item exists.
    pub present: bool,
    /// Payload bytes in the chunk.
    pub bytes: usize,
    /// Size counted against the per-item quota.
    pub item_size: usize,
}

/// Runs the inspect-remote command.
pub async fn run(profile: &Profile, format: &str) -> CommandResult {
    let controller = profile.controller();
    let layout = &controller.config().layout;
    let index = controller.read_index().await?;

    let mut result = InspectResult {
        path: profile.remote.path().display().to_string(),
        has_index: index.is_some(),
        chunk_count: 0,
        declared_fingerprint: String::new(),
        actual_fingerprint: String::new(),
        written_at: 0,
        chunks: Vec::new(),
        record_count: None,
        decode_error: None,
        stale_chunks: Vec::new(),
    };

    if let Some(index) = index {
        result.chunk_count = index.chunk_count;
        result.declared_fingerprint = index.fingerprint;
        result.written_at = index.written_at;

        let limit = controller.config().max_chunks;
        if index.chunk_count > limit {
            result.decode_error = Some(format!(
                "index declares {} chunks, limit is {limit}",
                index.chunk_count
            ));
        }
        let keys = layout.chunk_keys(0..index.chunk_count.min(limit));
        let items = profile.remote.get_many(&keys).await?;
        let parts: Vec<Option<&str>> = keys
            .iter()
            .map(|k| items.get(k).and_then(|v| v.as_str()))
            .collect();

        for (key, part) in keys.iter().zip(&parts) {
            result.chunks.push(ChunkInfo {
                key: key.clone(),
                present: part.is_some(),
                bytes: part.map_or(0, str::len),
                item_size: items.get(key).map_or(0, |v| item_size(key, v)),
            });
        }

        let payload = join_chunks(parts.iter().copied());
        result.actual_fingerprint = fingerprint(&payload);
        if result.decode_error.is_none() {
            match decode_payload(&payload) {
                Ok(decoded) => result.record_count = Some(decoded.prompts.len()),
                Err(e) => result.decode_error = Some(e.to_string()),
            }
        }
    }

    let all = profile.remote.snapshot();
    result.stale_chunks = all
        .keys()
        .filter(|k| k.starts_with(&layout.chunk_prefix))
        .filter(|k| !result.chunks.iter().any(|c| &c.key == *k))
        .cloned()
        .collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print_text(&result),
        other => return Err(format!("Unknown format {other:?} (expected text or json)").into()),
    }
    Ok(())
}

fn print_text(result: &InspectResult) {
    println!("Remote: {}", result.path);
    if !result.has_index {
        println!("No index found");
        return;
    }
    println!("Chunks:              {}", result.chunk_count);
    println!("Written at:          {} ms", result.written_at);
    println!("Declared fingerprint: {}", result.declared_fingerprint);
    println!("Actual fingerprint:   {}", result.actual_fingerprint);
    if result.declared_fingerprint != result.actual_fingerprint {
        println!("  (mismatch: a write may be incomplete)");
    }
    for chunk in &result.chunks {
        if chunk.present {
            println!(
                "  {}  {} bytes, {} / {} quota",
                chunk.key, chunk.bytes, chunk.item_size, REMOTE_ITEM_QUOTA
            );
        } else {
            println!("  {}  MISSING", chunk.key);
        }
    }
    match (&result.record_count, &result.decode_error) {
        (Some(count), _) => println!("Records: {count}"),
        (None, Some(error)) => println!("Payload does not decode: {error}"),
        (None, None) => {}
    }
    if !result.stale_chunks.is_empty() {
        println!("Stale chunks: {}", result.stale_chunks.join(", "));
    }
}
