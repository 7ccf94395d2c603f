//! Identity - opaque name of a signer or an invocation target

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, comparable identity token.
///
/// Any string can be wrapped; an empty or whitespace-only token is the
/// "null" identity and is rejected wherever a signer is admitted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// True for the null identity
    pub fn is_null(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_identity() {
        assert!(Identity::new("").is_null());
        assert!(Identity::new("   ").is_null());
        assert!(!Identity::new("alice").is_null());
    }

    #[test]
    fn test_identity_is_transparent_in_json() {
        let id = Identity::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
    }
}
