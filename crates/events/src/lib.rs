//! Custody Events - vault notifications and the JSONL journal
//!
//! Every state change of a vault is announced as a [`VaultEvent`] to an
//! [`EventSink`]. The sink never influences the vault's control flow.
//!
//! The [`JournalStore`] sink persists notifications as a hash-chained,
//! append-only JSONL log. The journal is the source of truth the CLI
//! replays to rebuild a vault.

pub mod error;
pub mod event;
pub mod hash;
pub mod reader;
pub mod sink;
pub mod store;

pub use error::EventError;
pub use event::{JournalRecord, VaultEvent};
pub use hash::{calculate_record_hash, verify_chain, ChainError, GENESIS_HASH};
pub use reader::JournalReader;
pub use sink::{EventSink, MemorySink};
pub use store::JournalStore;
