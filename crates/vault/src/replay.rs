//! Rebuild a vault from its journal
//!
//! Replay applies recorded state changes directly. Invocations are not
//! repeated and nothing is re-emitted to the sink.

use crate::error::{ReplayError, VaultError};
use crate::ledger::TransactionLedger;
use crate::registry::SignerRegistry;
use crate::vault::Vault;
use custody_events::{EventSink, VaultEvent};

impl<S: EventSink> Vault<S> {
    /// Rebuild from events in journal order (the first event is sequence 1)
    pub fn replay<'a, I>(events: I, sink: S) -> Result<Self, ReplayError>
    where
        I: IntoIterator<Item = &'a VaultEvent>,
    {
        let mut events = events.into_iter();

        let registry = match events.next() {
            Some(VaultEvent::VaultInitialized { signers, threshold }) => {
                SignerRegistry::initialize(signers.clone(), *threshold)
                    .map_err(|source| ReplayError::Rejected { sequence: 1, source })?
            }
            _ => return Err(ReplayError::MissingGenesis),
        };

        let mut vault = Self::from_parts(registry, TransactionLedger::new(), sink);
        let mut applied = 1;

        for (offset, event) in events.enumerate() {
            let sequence = offset as u64 + 2;
            vault.apply(sequence, event)?;
            applied += 1;
        }

        tracing::info!(
            events = applied,
            signers = vault.signer_count(),
            transactions = vault.transaction_count(),
            "Vault replayed"
        );
        Ok(vault)
    }

    fn apply(&mut self, sequence: u64, event: &VaultEvent) -> Result<(), ReplayError> {
        let rejected = |source: VaultError| ReplayError::Rejected { sequence, source };
        let threshold = self.registry.threshold();

        match event {
            VaultEvent::VaultInitialized { .. } => {
                return Err(ReplayError::DuplicateGenesis { sequence });
            }
            VaultEvent::ValueReceived { .. } => {}
            VaultEvent::TransactionProposed {
                proposer,
                index,
                target,
                value,
                payload,
            } => {
                let assigned = self
                    .ledger
                    .propose(&self.registry, proposer, target.clone(), *value, payload.clone())
                    .map_err(rejected)?;
                if assigned != *index {
                    return Err(ReplayError::IndexMismatch {
                        sequence,
                        recorded: *index,
                        assigned,
                    });
                }
            }
            VaultEvent::TransactionConfirmed { signer, index } => {
                self.ledger.confirm(&self.registry, signer, *index).map_err(rejected)?;
            }
            VaultEvent::ConfirmationRevoked { signer, index } => {
                self.ledger.revoke(&self.registry, signer, *index).map_err(rejected)?;
            }
            VaultEvent::TransactionExecuted { index, .. } => {
                self.ledger.mark_executed(*index, threshold).map_err(rejected)?;
            }
            VaultEvent::SignerAdded { by, signer } => {
                self.registry.add_signer(by, signer.clone()).map_err(rejected)?;
            }
            VaultEvent::SignerRemoved { by, signer } => {
                self.registry.remove_signer(by, signer).map_err(rejected)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NoopInvoker;
    use custody_core::{Amount, Identity, Payload};
    use custody_events::MemorySink;

    fn id(name: &str) -> Identity {
        Identity::from(name)
    }

    #[test]
    fn test_replay_reproduces_state() {
        let mut live = Vault::new(vec![id("A"), id("B"), id("C")], 2, MemorySink::new()).unwrap();
        live.receive(id("funder"), Amount::from_units(10));
        live.add_signer(&id("A"), id("D")).unwrap();
        let t0 = live.propose(&id("A"), id("X"), Amount::from_units(1), Payload::empty()).unwrap();
        let t1 = live.propose(&id("B"), id("Y"), Amount::from_units(2), Payload::new(vec![7])).unwrap();
        live.confirm(&id("A"), t0, &mut NoopInvoker).unwrap();
        live.confirm(&id("D"), t0, &mut NoopInvoker).unwrap();
        live.confirm(&id("C"), t1, &mut NoopInvoker).unwrap();
        live.revoke(&id("C"), t1).unwrap();
        live.confirm(&id("B"), t1, &mut NoopInvoker).unwrap();
        live.remove_signer(&id("D"), &id("B")).unwrap();

        let replayed = Vault::replay(live.sink().events(), MemorySink::new()).unwrap();

        assert_eq!(replayed.registry(), live.registry());
        assert_eq!(replayed.ledger(), live.ledger());
        assert!(replayed.sink().events().is_empty());
    }

    #[test]
    fn test_replay_requires_genesis() {
        let events = vec![VaultEvent::ValueReceived {
            sender: id("x"),
            amount: Amount::ZERO,
        }];
        let result = Vault::replay(&events, MemorySink::new());
        assert!(matches!(result, Err(ReplayError::MissingGenesis)));

        let empty: Vec<VaultEvent> = Vec::new();
        assert!(matches!(
            Vault::replay(&empty, MemorySink::new()),
            Err(ReplayError::MissingGenesis)
        ));
    }

    #[test]
    fn test_replay_rejects_impossible_history() {
        let events = vec![
            VaultEvent::VaultInitialized {
                signers: vec![id("A"), id("B"), id("C")],
                threshold: 2,
            },
            VaultEvent::TransactionConfirmed {
                signer: id("A"),
                index: 0,
            },
        ];
        let result = Vault::replay(&events, MemorySink::new());
        assert_eq!(
            result.err(),
            Some(ReplayError::Rejected {
                sequence: 2,
                source: VaultError::UnknownTransaction(0),
            })
        );
    }

    #[test]
    fn test_replay_rejects_second_genesis() {
        let genesis = VaultEvent::VaultInitialized {
            signers: vec![id("A"), id("B"), id("C")],
            threshold: 2,
        };
        let events = vec![genesis.clone(), genesis];
        let result = Vault::replay(&events, MemorySink::new());
        assert!(matches!(result, Err(ReplayError::DuplicateGenesis { sequence: 2 })));
    }
}
