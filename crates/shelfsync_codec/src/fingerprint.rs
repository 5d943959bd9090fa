//! Payload fingerprint.
//!
//! djb2 with xor mixing over UTF-16 code units, 32-bit wrapping, rendered as
//! unpadded lowercase hex. Hashing code units rather than bytes keeps the
//! value identical to fingerprints written by other clients of the same
//! remote data. Not collision resistant; used only to short-circuit equal
//! payloads.

const SEED: u32 = 5381;

/// Computes the fingerprint of `payload`.
pub fn fingerprint(payload: &str) -> String {
    let hash = payload
        .encode_utf16()
        .fold(SEED, |h, unit| (h << 5).wrapping_add(h) ^ u32::from(unit));
    format!("{hash:x}")
}
