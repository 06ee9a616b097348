//! On-disk formats for durable cache entries.
//!
//! Every codec wraps the value in a [`CacheEntry`] before encoding, so a
//! stored `null` / `None` is still a hit rather than an absent entry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted wrapper around a cached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct CodecError(pub String);

/// A serialize/deserialize pair defining a cache file format.
pub trait Codec: Send + Sync {
    /// File extension used for default cache filenames (no leading dot).
    fn extension(&self) -> &str;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Human-inspectable JSON entries: `{"value": ...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output, for caches meant to be read by people.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn extension(&self) -> &str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let entry = CacheEntry { value };
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(&entry)
        } else {
            serde_json::to_vec(&entry)
        };
        encoded.map_err(|e| CodecError(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice::<CacheEntry<T>>(bytes)
            .map(|entry| entry.value)
            .map_err(|e| CodecError(e.to_string()))
    }
}

/// Opaque binary entries for arbitrary serde object graphs.
///
/// Entries are tied to the exact shape of the stored type: changing a struct
/// definition makes older files undecodable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn extension(&self) -> &str {
        "bin"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(&CacheEntry { value }).map_err(|e| CodecError(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize::<CacheEntry<T>>(bytes)
            .map(|entry| entry.value)
            .map_err(|e| CodecError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Side {
        Bid,
        Ask,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Book {
        symbol: String,
        levels: BTreeMap<u64, Vec<(Side, f64)>>,
        last_trade: Option<u64>,
    }

    fn sample_book() -> Book {
        let mut levels = BTreeMap::new();
        levels.insert(100, vec![(Side::Bid, 1.5), (Side::Ask, 0.25)]);
        levels.insert(101, vec![(Side::Ask, 3.0)]);
        Book {
            symbol: "BTC".to_string(),
            levels,
            last_trade: None,
        }
    }

    #[test]
    fn test_json_entry_schema() {
        let value = serde_json::json!({"price": 100, "symbol": "BTC"});
        let bytes = JsonCodec::new().encode(&value).unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(raw, serde_json::json!({"value": {"price": 100, "symbol": "BTC"}}));

        let decoded: serde_json::Value = JsonCodec::new().decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_json_null_is_a_value() {
        let bytes = JsonCodec::new().encode(&Option::<u32>::None).unwrap();
        assert_eq!(bytes, br#"{"value":null}"#);
        let decoded: Option<u32> = JsonCodec::new().decode(&bytes).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_json_pretty_is_indented() {
        let bytes = JsonCodec::pretty().encode(&[1, 2]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n  \"value\""));
    }

    #[test]
    fn test_bincode_nested_graph() {
        let book = sample_book();
        let codec = BincodeCodec;
        let decoded: Book = codec.decode(&codec.encode(&book).unwrap()).unwrap();
        assert_eq!(decoded, book);
    }

    #[test]
    fn test_json_rejects_non_string_keys() {
        // Non-string map keys are fine for bincode but not for JSON objects.
        let mut map = BTreeMap::new();
        map.insert((1u8, 2u8), "pair");
        assert!(JsonCodec::new().encode(&map).is_err());
        assert!(BincodeCodec.encode(&map).is_ok());
    }

    #[test]
    fn test_foreign_bytes_fail_to_decode() {
        assert!(JsonCodec::new().decode::<u32>(b"not json").is_err());
        assert!(JsonCodec::new().decode::<u32>(br#"{"other": 1}"#).is_err());
        assert!(BincodeCodec.decode::<String>(&[0xff]).is_err());
    }
}
