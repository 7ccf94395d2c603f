//! Vault notifications

use chrono::{DateTime, Utc};
use custody_core::{Amount, Identity, Payload};
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

/// A state change announced by a vault.
///
/// Transaction indices are the positions assigned at proposal time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultEvent {
    /// Emitted once, when the vault is constructed
    VaultInitialized {
        signers: Vec<Identity>,
        threshold: usize,
    },

    /// Unconditional inbound transfer
    ValueReceived { sender: Identity, amount: Amount },

    TransactionProposed {
        proposer: Identity,
        index: usize,
        target: Identity,
        value: Amount,
        payload: Payload,
    },

    TransactionConfirmed { signer: Identity, index: usize },

    ConfirmationRevoked { signer: Identity, index: usize },

    /// The external invocation succeeded. `signer` is the confirmation that crossed quorum.
    TransactionExecuted { signer: Identity, index: usize },

    SignerAdded { by: Identity, signer: Identity },

    SignerRemoved { by: Identity, signer: Identity },
}

impl VaultEvent {
    /// Variant name, e.g. `"TransactionExecuted"`
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Transaction index the event refers to, if any
    pub fn transaction_index(&self) -> Option<usize> {
        match self {
            VaultEvent::TransactionProposed { index, .. }
            | VaultEvent::TransactionConfirmed { index, .. }
            | VaultEvent::ConfirmationRevoked { index, .. }
            | VaultEvent::TransactionExecuted { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// One line of the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// 1-based, strictly increasing
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub event: VaultEvent,
}
