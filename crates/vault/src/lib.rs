//! # Custody Vault
//!
//! Shared-custody approval state machine: a fixed quorum of signers must
//! jointly approve a transfer or an external invocation before it happens.
//!
//! ```text
//! caller ─► SignerRegistry ─► TransactionLedger ─► ExecutionEngine ─► Invoker
//!              (gate)          (confirmations)      (flag, then call)
//!                     └──────────── VaultEvent ───────────► EventSink
//! ```
//!
//! ## Guarantees
//! - At least 3 signers; threshold fixed with `2 <= threshold <= signers`
//! - The confirmation that reaches quorum executes in the same operation
//! - A transaction is marked executed before its invocation runs, so a
//!   reentrant call cannot execute it twice
//! - A failed operation leaves no trace, not even a notification

mod config;
mod engine;
mod error;
mod ledger;
mod registry;
mod replay;
mod vault;

pub use config::{ConfigError, VaultConfig};
pub use engine::{FnInvoker, Invocation, Invoker, NoopInvoker};
pub use error::{InvocationError, ReplayError, VaultError};
pub use ledger::{ConfirmationMatrix, TransactionLedger, TransactionRecord};
pub use registry::SignerRegistry;
pub use vault::{ConfirmOutcome, Vault};
