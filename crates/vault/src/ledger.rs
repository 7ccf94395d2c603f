//! Transaction ledger - proposal and confirmation bookkeeping
//!
//! Records are append-only and addressed by their proposal index. Only the
//! confirmation count and the executed flag ever change after proposal, and
//! nothing changes once a record is executed.

use crate::engine::Invocation;
use crate::error::VaultError;
use crate::registry::SignerRegistry;
use custody_core::{Amount, Identity, Payload};
use std::collections::BTreeSet;

/// A proposed action plus its approval bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    target: Identity,
    value: Amount,
    payload: Payload,
    executed: bool,
    confirmations: usize,
}

impl TransactionRecord {
    fn new(target: Identity, value: Amount, payload: Payload) -> Self {
        Self {
            target,
            value,
            payload,
            executed: false,
            confirmations: 0,
        }
    }

    pub fn target(&self) -> &Identity {
        &self.target
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations
    }
}

/// (transaction index, signer) -> confirmed
///
/// A row holds the signers whose entry is true. Rows are not touched when a
/// signer leaves the set, so confirmations from removed signers still count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationMatrix {
    rows: Vec<BTreeSet<Identity>>,
}

impl ConfirmationMatrix {
    fn push_row(&mut self) {
        self.rows.push(BTreeSet::new());
    }

    pub fn is_confirmed(&self, index: usize, signer: &Identity) -> bool {
        self.rows.get(index).map_or(false, |row| row.contains(signer))
    }

    /// Signers with a true entry, sorted
    pub fn row(&self, index: usize) -> Option<&BTreeSet<Identity>> {
        self.rows.get(index)
    }

    fn set(&mut self, index: usize, signer: &Identity) {
        if let Some(row) = self.rows.get_mut(index) {
            row.insert(signer.clone());
        }
    }

    fn clear(&mut self, index: usize, signer: &Identity) {
        if let Some(row) = self.rows.get_mut(index) {
            row.remove(signer);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLedger {
    records: Vec<TransactionRecord>,
    matrix: ConfirmationMatrix,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new record and return its index
    pub fn propose(
        &mut self,
        registry: &SignerRegistry,
        caller: &Identity,
        target: Identity,
        value: Amount,
        payload: Payload,
    ) -> Result<usize, VaultError> {
        registry.authorize(caller)?;

        let index = self.records.len();
        self.records.push(TransactionRecord::new(target, value, payload));
        self.matrix.push_row();
        Ok(index)
    }

    /// Check every confirm precondition without changing anything.
    ///
    /// Returns the confirmation count the record would have afterwards.
    pub fn check_confirm(
        &self,
        registry: &SignerRegistry,
        caller: &Identity,
        index: usize,
    ) -> Result<usize, VaultError> {
        registry.authorize(caller)?;
        let record = self.pending(index)?;

        if self.matrix.is_confirmed(index, caller) {
            return Err(VaultError::AlreadyConfirmedByCaller {
                index,
                signer: caller.clone(),
            });
        }

        Ok(record.confirmations + 1)
    }

    /// Record a confirmation that passed [`Self::check_confirm`]
    pub(crate) fn record_confirmation(&mut self, caller: &Identity, index: usize) -> usize {
        self.matrix.set(index, caller);
        let record = &mut self.records[index];
        record.confirmations += 1;
        record.confirmations
    }

    /// Confirm without executing; callers own the quorum decision.
    pub(crate) fn confirm(
        &mut self,
        registry: &SignerRegistry,
        caller: &Identity,
        index: usize,
    ) -> Result<usize, VaultError> {
        self.check_confirm(registry, caller, index)?;
        Ok(self.record_confirmation(caller, index))
    }

    pub fn revoke(
        &mut self,
        registry: &SignerRegistry,
        caller: &Identity,
        index: usize,
    ) -> Result<usize, VaultError> {
        registry.authorize(caller)?;
        self.pending(index)?;

        if !self.matrix.is_confirmed(index, caller) {
            return Err(VaultError::NotConfirmedByCaller {
                index,
                signer: caller.clone(),
            });
        }

        self.matrix.clear(index, caller);
        let record = &mut self.records[index];
        record.confirmations -= 1;
        Ok(record.confirmations)
    }

    /// Flip a record to executed and hand back what must be invoked.
    ///
    /// Re-validates that the record is still pending and still at quorum.
    /// The returned [`Invocation`] is the only way to learn what to call, so
    /// the terminal flag is always committed before any call is made.
    pub(crate) fn mark_executed(&mut self, index: usize, threshold: usize) -> Result<Invocation, VaultError> {
        let record = self.pending(index)?;
        if record.confirmations < threshold {
            return Err(VaultError::NotEnoughConfirmations {
                index,
                confirmations: record.confirmations,
                threshold,
            });
        }

        let record = &mut self.records[index];
        record.executed = true;

        Ok(Invocation {
            index,
            target: record.target.clone(),
            value: record.value,
            payload: record.payload.clone(),
        })
    }

    pub fn get(&self, index: usize) -> Result<&TransactionRecord, VaultError> {
        self.records.get(index).ok_or(VaultError::UnknownTransaction(index))
    }

    fn pending(&self, index: usize) -> Result<&TransactionRecord, VaultError> {
        let record = self.get(index)?;
        if record.executed {
            return Err(VaultError::AlreadyExecuted(index));
        }
        Ok(record)
    }

    pub fn is_confirmed(&self, index: usize, signer: &Identity) -> Result<bool, VaultError> {
        self.get(index)?;
        Ok(self.matrix.is_confirmed(index, signer))
    }

    /// Signers currently confirming a transaction, sorted
    pub fn confirmed_by(&self, index: usize) -> Result<Vec<Identity>, VaultError> {
        self.get(index)?;
        Ok(self
            .matrix
            .row(index)
            .map(|row| row.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = (usize, &TransactionRecord)> {
        self.records.iter().enumerate()
    }

    pub fn matrix(&self) -> &ConfirmationMatrix {
        &self.matrix
    }
}
