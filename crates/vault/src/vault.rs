//! The vault aggregate
//!
//! One owned value holds the whole state: the signer registry, the
//! transaction ledger, and an outbox of notifications not yet delivered.
//! All mutation goes through `&mut Vault`.
//!
//! Every public operation is atomic. Preconditions are checked before any
//! mutation; the only path that can fail after mutating (an executing
//! confirm) rolls back to a checkpoint. Notifications are delivered to the
//! sink only when the outermost operation returns, so work undone by a
//! failed execution is never observed.

use crate::engine::Invoker;
use crate::error::VaultError;
use crate::ledger::{TransactionLedger, TransactionRecord};
use crate::registry::SignerRegistry;
use custody_core::{Amount, Identity, Payload};
use custody_events::{EventSink, MemorySink, VaultEvent};

/// Result of a successful confirm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Recorded, quorum not reached yet
    Pending { confirmations: usize },
    /// Quorum reached and the invocation succeeded
    Executed,
}

impl ConfirmOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, ConfirmOutcome::Executed)
    }
}

/// Multi-signature vault
#[derive(Debug)]
pub struct Vault<S = MemorySink> {
    pub(crate) registry: SignerRegistry,
    pub(crate) ledger: TransactionLedger,
    pub(crate) outbox: Vec<VaultEvent>,
    depth: usize,
    sink: S,
}

impl<S: EventSink> Vault<S> {
    /// Construct a vault; announces `VaultInitialized` to the sink.
    pub fn new(signers: Vec<Identity>, threshold: usize, sink: S) -> Result<Self, VaultError> {
        let registry = SignerRegistry::initialize(signers, threshold)?;

        let mut vault = Self::from_parts(registry, TransactionLedger::new(), sink);
        vault.publish(VaultEvent::VaultInitialized {
            signers: vault.registry.signers().to_vec(),
            threshold,
        });
        vault.flush();

        tracing::info!(
            signers = vault.registry.len(),
            threshold,
            "Vault initialized"
        );
        Ok(vault)
    }

    pub(crate) fn from_parts(registry: SignerRegistry, ledger: TransactionLedger, sink: S) -> Self {
        Self {
            registry,
            ledger,
            outbox: Vec::new(),
            depth: 0,
            sink,
        }
    }

    // === Operations ===

    /// Inbound value-receipt endpoint. No authorization, no other effect.
    pub fn receive(&mut self, sender: Identity, amount: Amount) {
        tracing::debug!(sender = %sender, amount = %amount, "Value received");
        self.publish(VaultEvent::ValueReceived { sender, amount });

        // A receipt during an invocation travels with the enclosing operation
        if self.depth == 0 {
            self.flush();
        }
    }

    /// Propose a transaction; returns its index
    pub fn propose(
        &mut self,
        caller: &Identity,
        target: Identity,
        value: Amount,
        payload: Payload,
    ) -> Result<usize, VaultError> {
        self.transact(|vault| {
            let index = vault.ledger.propose(
                &vault.registry,
                caller,
                target.clone(),
                value,
                payload.clone(),
            )?;

            tracing::info!(index, proposer = %caller, target = %target, value = %value, "Transaction proposed");
            vault.publish(VaultEvent::TransactionProposed {
                proposer: caller.clone(),
                index,
                target,
                value,
                payload,
            });
            Ok(index)
        })
    }

    /// Confirm a transaction.
    ///
    /// The confirmation that reaches quorum executes the transaction through
    /// `invoker` in the same operation. If the invocation fails, the
    /// confirmation is unwound together with everything the invocation did
    /// and `ExecutionFailed` is returned.
    pub fn confirm<I>(&mut self, caller: &Identity, index: usize, invoker: &mut I) -> Result<ConfirmOutcome, VaultError>
    where
        I: Invoker<S> + ?Sized,
    {
        self.transact(|vault| {
            let confirmations = vault.ledger.check_confirm(&vault.registry, caller, index)?;

            if confirmations < vault.registry.threshold() {
                vault.ledger.record_confirmation(caller, index);
                vault.publish(VaultEvent::TransactionConfirmed {
                    signer: caller.clone(),
                    index,
                });
                tracing::info!(index, signer = %caller, confirmations, "Transaction confirmed");
                return Ok(ConfirmOutcome::Pending { confirmations });
            }

            let checkpoint = vault.checkpoint();
            vault.ledger.record_confirmation(caller, index);
            vault.publish(VaultEvent::TransactionConfirmed {
                signer: caller.clone(),
                index,
            });

            match vault.execute(caller, index, invoker) {
                Ok(()) => {
                    tracing::info!(index, signer = %caller, "Transaction executed");
                    Ok(ConfirmOutcome::Executed)
                }
                Err(e) => {
                    vault.restore(checkpoint);
                    tracing::warn!(index, signer = %caller, error = %e, "Execution failed, confirmation unwound");
                    Err(e)
                }
            }
        })
    }

    /// Withdraw the caller's confirmation of a pending transaction
    pub fn revoke(&mut self, caller: &Identity, index: usize) -> Result<(), VaultError> {
        self.transact(|vault| {
            let confirmations = vault.ledger.revoke(&vault.registry, caller, index)?;

            tracing::info!(index, signer = %caller, confirmations, "Confirmation revoked");
            vault.publish(VaultEvent::ConfirmationRevoked {
                signer: caller.clone(),
                index,
            });
            Ok(())
        })
    }

    pub fn add_signer(&mut self, caller: &Identity, new_signer: Identity) -> Result<(), VaultError> {
        self.transact(|vault| {
            vault.registry.add_signer(caller, new_signer.clone())?;

            tracing::info!(by = %caller, signer = %new_signer, "Signer added");
            vault.publish(VaultEvent::SignerAdded {
                by: caller.clone(),
                signer: new_signer,
            });
            Ok(())
        })
    }

    /// Remove a signer. Reorders the remaining signers (swap-remove).
    pub fn remove_signer(&mut self, caller: &Identity, target: &Identity) -> Result<(), VaultError> {
        self.transact(|vault| {
            vault.registry.remove_signer(caller, target)?;

            tracing::info!(by = %caller, signer = %target, "Signer removed");
            vault.publish(VaultEvent::SignerRemoved {
                by: caller.clone(),
                signer: target.clone(),
            });
            Ok(())
        })
    }

    // === Read surface ===

    pub fn signer_count(&self) -> usize {
        self.registry.len()
    }

    /// Current signers; order changes after any removal
    pub fn signers(&self) -> &[Identity] {
        self.registry.signers()
    }

    pub fn is_signer(&self, identity: &Identity) -> bool {
        self.registry.is_authorized(identity)
    }

    pub fn threshold(&self) -> usize {
        self.registry.threshold()
    }

    pub fn transaction_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn transaction(&self, index: usize) -> Result<&TransactionRecord, VaultError> {
        self.ledger.get(index)
    }

    pub fn transactions(&self) -> impl Iterator<Item = (usize, &TransactionRecord)> {
        self.ledger.records()
    }

    pub fn is_confirmed(&self, index: usize, signer: &Identity) -> Result<bool, VaultError> {
        self.ledger.is_confirmed(index, signer)
    }

    pub fn confirmed_by(&self, index: usize) -> Result<Vec<Identity>, VaultError> {
        self.ledger.confirmed_by(index)
    }

    pub fn registry(&self) -> &SignerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // === Plumbing ===

    pub(crate) fn publish(&mut self, event: VaultEvent) {
        self.outbox.push(event);
    }

    /// Run one public operation. Nested (reentrant) operations share the
    /// outbox; it is delivered when the outermost one returns.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T, VaultError>) -> Result<T, VaultError> {
        self.depth += 1;
        let result = op(self);
        self.depth -= 1;

        if self.depth == 0 {
            self.flush();
        }
        result
    }

    fn flush(&mut self) {
        let events = std::mem::take(&mut self.outbox);
        if events.is_empty() {
            return;
        }

        tracing::trace!(sink = self.sink.name(), count = events.len(), "Delivering notifications");
        self.sink.emit_all(&events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FnInvoker, Invocation, NoopInvoker};
    use crate::error::InvocationError;
    use rust_decimal_macros::dec;

    fn id(name: &str) -> Identity {
        Identity::from(name)
    }

    fn vault() -> Vault {
        Vault::new(vec![id("A"), id("B"), id("C")], 2, MemorySink::new()).unwrap()
    }

    fn propose_x(vault: &mut Vault) -> usize {
        vault
            .propose(&id("A"), id("X"), Amount::from_units(1), Payload::empty())
            .unwrap()
    }

    #[test]
    fn test_new_announces_initialization() {
        let vault = vault();
        assert_eq!(
            vault.sink().events(),
            &[VaultEvent::VaultInitialized {
                signers: vec![id("A"), id("B"), id("C")],
                threshold: 2,
            }]
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Vault::new(vec![id("A"), id("B")], 2, MemorySink::new());
        assert!(matches!(result, Err(VaultError::NotEnoughSigners { .. })));
    }

    #[test]
    fn test_receive_only_notifies() {
        let mut vault = vault();
        vault.receive(id("anyone"), Amount::from_units(5));

        assert_eq!(vault.transaction_count(), 0);
        assert_eq!(
            vault.sink().events().last(),
            Some(&VaultEvent::ValueReceived {
                sender: id("anyone"),
                amount: Amount::from_units(5),
            })
        );
    }

    #[test]
    fn test_confirm_below_quorum_is_pending() {
        let mut vault = vault();
        let index = propose_x(&mut vault);

        let outcome = vault.confirm(&id("A"), index, &mut NoopInvoker).unwrap();
        assert_eq!(outcome, ConfirmOutcome::Pending { confirmations: 1 });
        assert!(!vault.transaction(index).unwrap().executed());
    }

    #[test]
    fn test_quorum_confirm_invokes_once_with_record() {
        let mut vault = vault();
        let index = propose_x(&mut vault);
        vault.confirm(&id("A"), index, &mut NoopInvoker).unwrap();

        let mut calls: Vec<Invocation> = Vec::new();
        let mut invoker = FnInvoker(|v: &mut Vault, call: &Invocation| -> Result<(), InvocationError> {
            // The flag is already committed when the call is made
            assert!(v.transaction(call.index).unwrap().executed());
            calls.push(call.clone());
            Ok(())
        });

        let outcome = vault.confirm(&id("B"), index, &mut invoker).unwrap();
        assert!(outcome.is_executed());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, id("X"));
        assert_eq!(calls[0].value, Amount::from_units(1));
    }

    #[test]
    fn test_failed_execution_restores_state_and_sink() {
        let mut vault = vault();
        let index = propose_x(&mut vault);
        vault.confirm(&id("A"), index, &mut NoopInvoker).unwrap();

        let ledger_before = vault.ledger().clone();
        let events_before = vault.sink().events().len();

        let mut failing = FnInvoker(|_: &mut Vault, call: &Invocation| -> Result<(), InvocationError> {
            Err(InvocationError::rejected(&call.target, "reverted"))
        });
        let result = vault.confirm(&id("B"), index, &mut failing);

        assert!(matches!(result, Err(VaultError::ExecutionFailed { index: 0, .. })));
        assert_eq!(vault.ledger(), &ledger_before);
        assert!(!vault.is_confirmed(index, &id("B")).unwrap());
        assert_eq!(vault.sink().events().len(), events_before);
    }

    /// Records how notifications were grouped on delivery
    #[derive(Debug, Default)]
    struct BatchSink {
        batches: Vec<Vec<VaultEvent>>,
    }

    impl EventSink for BatchSink {
        fn name(&self) -> &str {
            "batch"
        }

        fn emit(&mut self, event: &VaultEvent) {
            self.batches.push(vec![event.clone()]);
        }

        fn emit_all(&mut self, events: &[VaultEvent]) {
            self.batches.push(events.to_vec());
        }
    }

    #[test]
    fn test_operation_is_delivered_as_one_batch() -> anyhow::Result<()> {
        let mut vault = Vault::new(vec![id("A"), id("B"), id("C")], 2, BatchSink::default())?;
        let index = vault.propose(&id("A"), id("X"), Amount::new(dec!(2.5))?, Payload::empty())?;
        vault.confirm(&id("A"), index, &mut NoopInvoker)?;

        let mut invoker = FnInvoker(|v: &mut Vault<BatchSink>, call: &Invocation| -> Result<(), InvocationError> {
            v.receive(call.target.clone(), call.value);
            Ok(())
        });
        vault.confirm(&id("B"), index, &mut invoker)?;

        let last = vault.sink().batches.last().cloned().unwrap_or_default();
        assert_eq!(
            last,
            vec![
                VaultEvent::TransactionConfirmed { signer: id("B"), index },
                VaultEvent::ValueReceived {
                    sender: id("X"),
                    amount: Amount::new(dec!(2.5))?,
                },
                VaultEvent::TransactionExecuted { signer: id("B"), index },
            ]
        );
        // init, propose, first confirm, executing confirm
        assert_eq!(vault.sink().batches.len(), 4);
        Ok(())
    }

    #[test]
    fn test_receipt_inside_failed_execution_is_unwound() -> anyhow::Result<()> {
        let mut vault = vault();
        let index = propose_x(&mut vault);
        vault.confirm(&id("A"), index, &mut NoopInvoker)?;
        let before = vault.sink().events().len();

        let mut invoker = FnInvoker(|v: &mut Vault, call: &Invocation| -> Result<(), InvocationError> {
            v.receive(id("refund"), Amount::from_units(1));
            Err(InvocationError::rejected(&call.target, "reverted"))
        });
        assert!(vault.confirm(&id("B"), index, &mut invoker).is_err());

        assert_eq!(vault.sink().events().len(), before);
        Ok(())
    }

    #[test]
    fn test_failed_preconditions_emit_nothing() {
        let mut vault = vault();
        let before = vault.sink().events().len();

        assert!(vault.confirm(&id("A"), 0, &mut NoopInvoker).is_err());
        assert!(vault.revoke(&id("Z"), 0).is_err());
        assert!(vault.remove_signer(&id("A"), &id("B")).is_err());

        assert_eq!(vault.sink().events().len(), before);
    }
}
