//! Byte-bounded chunking of payload strings.

use crate::error::{CodecError, CodecResult};

/// Default payload bytes per chunk. Kept well under the remote store's
/// 8192 byte per-item ceiling to leave room for the key and JSON quoting.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 7000;

/// Splits `payload` left to right into chunks of at most `max_bytes` UTF-8
/// bytes each.
///
/// For every starting character, a binary search finds the longest run of
/// whole characters whose encoded length fits. Chunk boundaries therefore
/// always fall between characters, and every chunk is valid UTF-8 on its
/// own. An empty payload yields no chunks.
///
/// # Errors
///
/// Returns [`CodecError::ChunkLimitTooSmall`] if a single character is wider
/// than `max_bytes`. Oversized content is never truncated.
pub fn split_chunks(payload: &str, max_bytes: usize) -> CodecResult<Vec<String>> {
    // Byte offset of every character start, plus the end of the string.
    let offsets: Vec<usize> = payload
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(payload.len()))
        .collect();
    let char_count = offsets.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_count {
        let fits = |n: usize| offsets[start + n] - offsets[start] <= max_bytes;

        let mut low = 1;
        let mut high = (char_count - start).min(max_bytes);
        let mut best = 0;
        while low <= high {
            let mid = low + (high - low) / 2;
            if fits(mid) {
                best = mid;
                low = mid + 1;
            } else {
                high = mid - 1;
            }
        }

        if best == 0 {
            return Err(CodecError::ChunkLimitTooSmall {
                offset: offsets[start],
                width: offsets[start + 1] - offsets[start],
                max_bytes,
            });
        }

        chunks.push(payload[offsets[start]..offsets[start + best]].to_string());
        start += best;
    }

    Ok(chunks)
}

/// Concatenates chunks in index order.
///
/// Missing chunks (`None`) are treated as empty strings: a reader racing a
/// partial remote write sees a gap rather than an error, and the decode
/// step rejects the resulting payload if it is incomplete.
pub fn join_chunks<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    chunks.into_iter().flatten().collect()
}
