//! Treasury - the CLI's invocation target
//!
//! Holds the value under the vault's custody. Deposits credit the vault;
//! an executed transaction moves its value from the vault to its target.

use custody_core::{Amount, Identity};
use custody_events::{EventSink, VaultEvent};
use custody_vault::{Invocation, InvocationError, Invoker, Vault};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Treasury {
    vault_balance: Amount,
    balances: BTreeMap<Identity, Amount>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit the vault. Returns `false` (and changes nothing) on overflow.
    pub fn deposit(&mut self, amount: Amount) -> bool {
        match self.vault_balance.checked_add(&amount) {
            Some(balance) => {
                self.vault_balance = balance;
                true
            }
            None => false,
        }
    }

    pub fn vault_balance(&self) -> Amount {
        self.vault_balance
    }

    /// Value paid out to `identity` by executed transactions
    pub fn balance_of(&self, identity: &Identity) -> Amount {
        self.balances.get(identity).copied().unwrap_or_default()
    }

    pub fn payees(&self) -> impl Iterator<Item = (&Identity, &Amount)> {
        self.balances.iter()
    }

    fn transfer(&mut self, target: &Identity, value: Amount) -> Result<(), InvocationError> {
        let remaining = self
            .vault_balance
            .checked_sub(&value)
            .ok_or(InvocationError::InsufficientFunds {
                requested: value,
                available: self.vault_balance,
            })?;
        let credited = self
            .balance_of(target)
            .checked_add(&value)
            .ok_or_else(|| InvocationError::rejected(target, "balance overflow"))?;

        self.vault_balance = remaining;
        self.balances.insert(target.clone(), credited);
        Ok(())
    }

    /// Rebuild balances from journal events.
    ///
    /// `vault` must already be replayed from the same events; executed
    /// transfers are looked up there.
    pub fn replay<'a, S, I>(events: I, vault: &Vault<S>) -> Self
    where
        S: EventSink,
        I: IntoIterator<Item = &'a VaultEvent>,
    {
        let mut treasury = Self::new();

        for event in events {
            match event {
                VaultEvent::ValueReceived { amount, .. } => {
                    treasury.deposit(*amount);
                }
                VaultEvent::TransactionExecuted { index, .. } => {
                    if let Ok(record) = vault.transaction(*index) {
                        if let Err(e) = treasury.transfer(record.target(), record.value()) {
                            tracing::warn!(index, error = %e, "Journal transfer does not balance");
                        }
                    }
                }
                _ => {}
            }
        }

        treasury
    }
}

impl<S: EventSink> Invoker<S> for Treasury {
    fn invoke(&mut self, _vault: &mut Vault<S>, call: &Invocation) -> Result<(), InvocationError> {
        self.transfer(&call.target, call.value)?;

        tracing::info!(
            index = call.index,
            target = %call.target,
            value = %call.value,
            payload = %call.payload.digest(),
            "Treasury transfer"
        );
        Ok(())
    }
}
