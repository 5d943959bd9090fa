//! Collection payload encoding.
//!
//! A payload is the JSON serialization of `{"prompts": [...], "ts": <ms>}`.
//! The timestamp is write metadata only, but it is part of the string and
//! therefore part of the fingerprint: re-encoding an unchanged collection at
//! a different instant yields a different fingerprint.

use crate::error::{CodecError, CodecResult};
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// A decoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncPayload {
    /// The serialized collection.
    #[serde(default)]
    pub prompts: Vec<Record>,
    /// Milliseconds since the Unix epoch when the payload was encoded.
    #[serde(default)]
    pub ts: i64,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    prompts: &'a [Record],
    ts: i64,
}

/// Serializes a collection and a write timestamp into one payload string.
///
/// Deterministic for identical `records` and `ts`.
pub fn encode_payload(records: &[Record], ts: i64) -> CodecResult<String> {
    serde_json::to_string(&PayloadRef {
        prompts: records,
        ts,
    })
    .map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Parses a payload produced by [`encode_payload`].
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] for truncated or corrupt input,
/// such as a payload reassembled from an incomplete set of chunks.
pub fn decode_payload(payload: &str) -> CodecResult<SyncPayload> {
    serde_json::from_str(payload).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let records = vec![Record::with_id("a", "", "hello", 100)];
        let payload = encode_payload(&records, 7).unwrap();
        assert_eq!(
            payload,
            r#"{"prompts":[{"id":"a","title":"","text":"hello","tags":[],"category":"other","updatedAt":100}],"ts":7}"#
        );
    }

    #[test]
    fn encode_is_deterministic() {
        let records = vec![
            Record::with_id("a", "t", "one", 1),
            Record::with_id("b", "u", "two", 2),
        ];
        assert_eq!(
            encode_payload(&records, 5).unwrap(),
            encode_payload(&records, 5).unwrap()
        );
        assert_ne!(
            encode_payload(&records, 5).unwrap(),
            encode_payload(&records, 6).unwrap()
        );
    }

    #[test]
    fn decode_restores_records() {
        let records = vec![Record::with_id("a", "t", "héllo ✓", 1)];
        let decoded = decode_payload(&encode_payload(&records, 9).unwrap()).unwrap();
        assert_eq!(decoded.prompts, records);
        assert_eq!(decoded.ts, 9);
    }

    #[test]
    fn decode_missing_prompts_is_empty() {
        let decoded = decode_payload(r#"{"ts":1}"#).unwrap();
        assert!(decoded.prompts.is_empty());
    }

    #[test]
    fn truncated_payload_fails() {
        let payload = encode_payload(&[Record::with_id("a", "", "x", 1)], 1).unwrap();
        let truncated = &payload[..payload.len() / 2];
        assert!(matches!(
            decode_payload(truncated),
            Err(CodecError::DecodingFailed { .. })
        ));
    }
}
