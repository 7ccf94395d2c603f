//! Execution engine - the single side-effecting step
//!
//! ```text
//! confirm (crosses quorum)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ checkpoint       │  registry, ledger, outbox length
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ record confirm   │
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ mark executed    │  terminal flag committed, Invocation handed out
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ Invoker::invoke  │──► Err? restore checkpoint, ExecutionFailed
//! └────────┬─────────┘
//!          ▼
//!   TransactionExecuted
//! ```
//!
//! The invoker is handed the very vault it is called from. Anything it does
//! to that vault happens after the executed flag is set, so a reentrant
//! confirm or revoke of the same transaction fails with `AlreadyExecuted`.

use crate::error::{InvocationError, VaultError};
use crate::ledger::TransactionLedger;
use crate::registry::SignerRegistry;
use crate::vault::Vault;
use custody_core::{Amount, Identity, Payload};
use custody_events::{EventSink, VaultEvent};

/// What an executed transaction asks the outside world to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub index: usize,
    pub target: Identity,
    pub value: Amount,
    pub payload: Payload,
}

/// External-invocation interface.
///
/// Performs the call described by `call` and reports success or failure.
/// No retries, no partial success. The `vault` handle allows the callee to
/// re-enter the vault that is executing.
pub trait Invoker<S: EventSink> {
    fn invoke(&mut self, vault: &mut Vault<S>, call: &Invocation) -> Result<(), InvocationError>;
}

/// Invoker that accepts every call and does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvoker;

impl<S: EventSink> Invoker<S> for NoopInvoker {
    fn invoke(&mut self, _vault: &mut Vault<S>, _call: &Invocation) -> Result<(), InvocationError> {
        Ok(())
    }
}

/// Adapts a closure into an [`Invoker`]
pub struct FnInvoker<F>(pub F);

impl<S, F> Invoker<S> for FnInvoker<F>
where
    S: EventSink,
    F: FnMut(&mut Vault<S>, &Invocation) -> Result<(), InvocationError>,
{
    fn invoke(&mut self, vault: &mut Vault<S>, call: &Invocation) -> Result<(), InvocationError> {
        (self.0)(vault, call)
    }
}

/// Vault state as it was before an executing confirm
pub(crate) struct Checkpoint {
    registry: SignerRegistry,
    ledger: TransactionLedger,
    outbox_len: usize,
}

impl<S: EventSink> Vault<S> {
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            registry: self.registry.clone(),
            ledger: self.ledger.clone(),
            outbox_len: self.outbox.len(),
        }
    }

    /// Undo everything since `checkpoint`, including reentrant work
    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.registry = checkpoint.registry;
        self.ledger = checkpoint.ledger;
        self.outbox.truncate(checkpoint.outbox_len);
    }

    /// Execute a transaction whose confirmation just reached quorum.
    ///
    /// Only reachable from `confirm`; the caller restores its checkpoint
    /// when this fails.
    pub(crate) fn execute<I>(&mut self, signer: &Identity, index: usize, invoker: &mut I) -> Result<(), VaultError>
    where
        I: Invoker<S> + ?Sized,
    {
        let call = self.ledger.mark_executed(index, self.registry.threshold())?;

        tracing::info!(
            index,
            target = %call.target,
            value = %call.value,
            payload_len = call.payload.len(),
            "Executing transaction"
        );

        invoker
            .invoke(self, &call)
            .map_err(|source| VaultError::ExecutionFailed { index, source })?;

        self.publish(VaultEvent::TransactionExecuted {
            signer: signer.clone(),
            index,
        });
        Ok(())
    }
}
