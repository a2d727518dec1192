//! Versioned blob encoding for the persistence boundary.
//!
//! Behaviour patterns and history store-id lists are stored as a JSON
//! envelope `{"version": N, "data": ...}`. Decoding rejects versions this
//! build does not know, so a newer writer can never be misread silently.

use crate::error::{DataError, Result};
use crate::types::{BehaviorPatterns, StoreId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Current format version for behaviour pattern blobs
pub const BEHAVIOR_PATTERNS_VERSION: u32 = 1;

/// Current format version for store-id list blobs
pub const STORE_IDS_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

fn encode<T: Serialize>(version: u32, data: &T) -> Result<String> {
    Ok(serde_json::to_string(&EnvelopeRef { version, data })?)
}

fn decode<T: DeserializeOwned>(kind: &'static str, expected: u32, blob: &str) -> Result<T> {
    // Peek at the version first so an unknown layout reports the version,
    // not a confusing shape error.
    let header: serde_json::Value = serde_json::from_str(blob)?;
    let version = header
        .get("version")
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| DataError::InvalidValue {
            field: format!("{kind}.version"),
            value: blob.chars().take(32).collect(),
        })?;
    if version != expected {
        return Err(DataError::UnsupportedVersion { kind, version });
    }
    let envelope: Envelope<T> = serde_json::from_value(header)?;
    Ok(envelope.data)
}

pub fn encode_behavior_patterns(patterns: &BehaviorPatterns) -> Result<String> {
    encode(BEHAVIOR_PATTERNS_VERSION, patterns)
}

pub fn decode_behavior_patterns(blob: &str) -> Result<BehaviorPatterns> {
    decode("behavior_patterns", BEHAVIOR_PATTERNS_VERSION, blob)
}

pub fn encode_store_ids(ids: &[StoreId]) -> Result<String> {
    encode(STORE_IDS_VERSION, &ids)
}

pub fn decode_store_ids(blob: &str) -> Result<Vec<StoreId>> {
    decode("store_ids", STORE_IDS_VERSION, blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_behavior_patterns_blob() {
        let mut patterns = BehaviorPatterns::new();
        patterns.insert("interaction_count".to_string(), json!(12));
        patterns.insert("positive_ratio".to_string(), json!(0.75));

        let blob = encode_behavior_patterns(&patterns).unwrap();
        assert!(blob.contains("\"version\":1"));
        assert_eq!(decode_behavior_patterns(&blob).unwrap(), patterns);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let blob = r#"{"version":7,"data":[1,2,3]}"#;
        match decode_store_ids(blob) {
            Err(DataError::UnsupportedVersion { version, .. }) => assert_eq!(version, 7),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_version_rejected() {
        assert!(decode_store_ids("[1,2,3]").is_err());
    }

    #[test]
    fn test_out_of_range_version_rejected() {
        // 2^32 + 1 would wrap to version 1
        let blob = r#"{"version":4294967297,"data":[1,2,3]}"#;
        assert!(matches!(decode_store_ids(blob), Err(DataError::InvalidValue { .. })));
    }
}
