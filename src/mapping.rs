//! Export hashing
//!
//! Content addressing for exported calendars. The request body is
//! re-serialized canonically (sorted keys, no whitespace) and the first 16
//! hex chars of its SHA-256 become the calendar's public name.
//!
//! Sixteen hex chars are 64 bits of digest. Collisions are not defended
//! against beyond that.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Length of the public hash, in hex characters.
pub const HASH_LEN: usize = 16;

const CALENDAR_EXTENSION: &str = ".ics";

/// Canonical JSON of `body`: object keys sorted, compact separators.
pub fn canonical_payload(body: &Value) -> Result<String> {
    // serde_json's default Map is ordered by key
    Ok(serde_json::to_string(body)?)
}

/// First [`HASH_LEN`] hex chars of the SHA-256 of `payload`.
pub fn content_hash(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut hex = format!("{:x}", digest);
    hex.truncate(HASH_LEN);
    hex
}

/// Canonical payload and its hash, computed together for an export.
pub fn hash_body(body: &Value) -> Result<(String, String)> {
    let payload = canonical_payload(body)?;
    let hash = content_hash(payload.as_bytes());
    Ok((hash, payload))
}

/// Whether `value` is exactly [`HASH_LEN`] lowercase or uppercase hex chars.
pub fn is_valid_hash(value: &str) -> bool {
    value.len() == HASH_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Extracts the hash from a `<hash>.ics` file name.
pub fn parse_calendar_file(file: &str) -> Option<&str> {
    file.strip_suffix(CALENDAR_EXTENSION)
        .filter(|hash| is_valid_hash(hash))
}
