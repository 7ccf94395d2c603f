//! Hash chain utilities for journal integrity

use crate::event::{JournalRecord, VaultEvent};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

/// `prev_hash` of the first record
pub const GENESIS_HASH: &str = "GENESIS";

/// Calculate SHA256 over a record's content (everything except `hash`)
pub fn calculate_record_hash(
    sequence: u64,
    prev_hash: &str,
    timestamp: &DateTime<Utc>,
    event: &VaultEvent,
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();

    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(serde_json::to_vec(event)?);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify hash chain integrity
pub fn verify_chain(records: &[JournalRecord]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS_HASH.to_string();
    let mut expected_sequence = 1;

    for record in records {
        if record.sequence != expected_sequence {
            return Err(ChainError::InvalidSequence {
                expected: expected_sequence,
                actual: record.sequence,
            });
        }

        if record.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated = calculate_record_hash(
            record.sequence,
            &record.prev_hash,
            &record.timestamp,
            &record.event,
        )
        .map_err(|e| ChainError::Unhashable {
            sequence: record.sequence,
            reason: e.to_string(),
        })?;

        if record.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        prev_hash = record.hash.clone();
        expected_sequence += 1;
    }

    Ok(())
}

/// Errors in hash chain verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },
    InvalidSequence {
        expected: u64,
        actual: u64,
    },
    Unhashable {
        sequence: u64,
        reason: String,
    },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::BrokenLink {
                sequence,
                expected,
                actual,
            } => write!(
                f,
                "Broken link at seq {}: expected prev_hash '{}', got '{}'",
                sequence, expected, actual
            ),
            ChainError::InvalidHash {
                sequence,
                expected,
                actual,
            } => write!(
                f,
                "Invalid hash at seq {}: expected '{}', got '{}'",
                sequence, expected, actual
            ),
            ChainError::InvalidSequence { expected, actual } => {
                write!(f, "Invalid sequence: expected {}, got {}", expected, actual)
            }
            ChainError::Unhashable { sequence, reason } => {
                write!(f, "Cannot hash record at seq {}: {}", sequence, reason)
            }
        }
    }
}

impl std::error::Error for ChainError {}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_core::Identity;

    fn record(sequence: u64, prev_hash: &str) -> JournalRecord {
        let timestamp = Utc::now();
        let event = VaultEvent::TransactionConfirmed {
            signer: Identity::from("alice"),
            index: sequence as usize,
        };
        let hash = calculate_record_hash(sequence, prev_hash, &timestamp, &event).unwrap();
        JournalRecord {
            sequence,
            prev_hash: prev_hash.to_string(),
            hash,
            timestamp,
            event,
        }
    }

    #[test]
    fn test_verify_valid_chain() {
        let r1 = record(1, GENESIS_HASH);
        let r2 = record(2, &r1.hash);
        let r3 = record(3, &r2.hash);
        assert!(verify_chain(&[r1, r2, r3]).is_ok());
    }

    #[test]
    fn test_empty_chain_is_valid() {
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_verify_broken_link() {
        let r1 = record(1, GENESIS_HASH);
        let r2 = record(2, "wrong_hash");
        let result = verify_chain(&[r1, r2]);
        assert!(matches!(result, Err(ChainError::BrokenLink { sequence: 2, .. })));
    }

    #[test]
    fn test_tampered_event_detected() {
        let r1 = record(1, GENESIS_HASH);
        let mut r2 = record(2, &r1.hash);
        r2.event = VaultEvent::TransactionConfirmed {
            signer: Identity::from("mallory"),
            index: 2,
        };
        let result = verify_chain(&[r1, r2]);
        assert!(matches!(result, Err(ChainError::InvalidHash { sequence: 2, .. })));
    }

    #[test]
    fn test_sequence_gap_detected() {
        let r1 = record(1, GENESIS_HASH);
        let r3 = record(3, &r1.hash);
        let result = verify_chain(&[r1, r3]);
        assert_eq!(
            result,
            Err(ChainError::InvalidSequence {
                expected: 2,
                actual: 3
            })
        );
    }
}
