//! Signer registry - the authorization gate
//!
//! Owns the signer set and the quorum threshold. The threshold is fixed at
//! construction; the set may grow or shrink but never below
//! [`MIN_SIGNERS`] or below the threshold.
//!
//! Removal is a swap-remove: the last signer moves into the vacated slot,
//! so enumeration order is not stable across removals.

use crate::error::VaultError;
use custody_core::{Identity, MIN_SIGNERS, MIN_THRESHOLD};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerRegistry {
    signers: Vec<Identity>,
    threshold: usize,
}

impl SignerRegistry {
    /// Validate and establish the initial signer set and threshold
    pub fn initialize(signers: Vec<Identity>, threshold: usize) -> Result<Self, VaultError> {
        if signers.len() < MIN_SIGNERS {
            return Err(VaultError::NotEnoughSigners {
                count: signers.len(),
                min: MIN_SIGNERS,
            });
        }

        let mut seen = HashSet::with_capacity(signers.len());
        for signer in &signers {
            if signer.is_null() {
                return Err(VaultError::NullIdentity);
            }
            if !seen.insert(signer) {
                return Err(VaultError::DuplicateSigner(signer.clone()));
            }
        }

        if threshold < MIN_THRESHOLD || threshold > signers.len() {
            return Err(VaultError::InvalidThreshold {
                threshold,
                signers: signers.len(),
            });
        }

        Ok(Self { signers, threshold })
    }

    pub fn is_authorized(&self, identity: &Identity) -> bool {
        self.signers.contains(identity)
    }

    /// Fails with `NotAuthorized` unless `caller` is a signer
    pub fn authorize(&self, caller: &Identity) -> Result<(), VaultError> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            Err(VaultError::NotAuthorized(caller.clone()))
        }
    }

    pub fn add_signer(&mut self, caller: &Identity, new_signer: Identity) -> Result<(), VaultError> {
        self.authorize(caller)?;

        if new_signer.is_null() {
            return Err(VaultError::NullIdentity);
        }
        if self.is_authorized(&new_signer) {
            return Err(VaultError::DuplicateSigner(new_signer));
        }

        self.signers.push(new_signer);
        Ok(())
    }

    pub fn remove_signer(&mut self, caller: &Identity, target: &Identity) -> Result<(), VaultError> {
        self.authorize(caller)?;

        let position = self
            .signers
            .iter()
            .position(|s| s == target)
            .ok_or_else(|| VaultError::NotASigner(target.clone()))?;

        let remaining = self.signers.len() - 1;
        if remaining < MIN_SIGNERS {
            return Err(VaultError::MinSignersViolation {
                remaining,
                min: MIN_SIGNERS,
            });
        }
        if remaining < self.threshold {
            return Err(VaultError::InvalidThreshold {
                threshold: self.threshold,
                signers: remaining,
            });
        }

        self.signers.swap_remove(position);
        Ok(())
    }

    /// Signers in current order (unstable across removals)
    pub fn signers(&self) -> &[Identity] {
        &self.signers
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}
