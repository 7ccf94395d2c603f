//! Payload - opaque call data for an external invocation

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Payload is not valid hex: {0}")]
    InvalidHex(String),
}

/// Opaque bytes handed to the invocation target untouched.
///
/// Serialized as a lowercase hex string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parse from hex, accepting an optional `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, PayloadError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex::decode(digits)
            .map(Self)
            .map_err(|e| PayloadError::InvalidHex(e.to_string()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA256 digest of the raw bytes, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Payload::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_with_prefix() {
        let payload = Payload::from_hex("0xdeadbeef").unwrap();
        assert_eq!(payload.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(payload.to_string(), "0xdeadbeef");
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(Payload::from_hex("zz"), Err(PayloadError::InvalidHex(_))));
    }

    #[test]
    fn test_digest_of_empty_payload() {
        // SHA256("")
        assert_eq!(
            Payload::empty().digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_json_is_hex_string() {
        let payload = Payload::new(vec![1u8, 2, 255]);
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, "\"0102ff\"");
        let parsed: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload);
    }
}
