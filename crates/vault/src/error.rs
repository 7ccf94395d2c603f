//! Vault errors
//!
//! Every error aborts the operation that raised it and leaves the vault
//! exactly as it was before the call.

use custody_core::{Amount, Identity};
use strum_macros::IntoStaticStr;
use thiserror::Error;

/// Errors from vault operations
///
/// [`VaultError::kind`] is the variant name, the stable error kind.
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
pub enum VaultError {
    // === Authorization ===
    #[error("{0} is not an authorized signer")]
    NotAuthorized(Identity),

    // === Construction / membership ===
    #[error("At least {min} signers required, got {count}")]
    NotEnoughSigners { count: usize, min: usize },

    #[error("Signer identity cannot be empty")]
    NullIdentity,

    #[error("Duplicate signer: {0}")]
    DuplicateSigner(Identity),

    #[error("Invalid threshold {threshold} for {signers} signers")]
    InvalidThreshold { threshold: usize, signers: usize },

    #[error("Removing a signer would leave {remaining}, minimum is {min}")]
    MinSignersViolation { remaining: usize, min: usize },

    #[error("{0} is not a signer")]
    NotASigner(Identity),

    // === Transaction lookup / state ===
    #[error("Unknown transaction #{0}")]
    UnknownTransaction(usize),

    #[error("Transaction #{0} already executed")]
    AlreadyExecuted(usize),

    #[error("Transaction #{index} already confirmed by {signer}")]
    AlreadyConfirmedByCaller { index: usize, signer: Identity },

    #[error("Transaction #{index} not confirmed by {signer}")]
    NotConfirmedByCaller { index: usize, signer: Identity },

    // === Execution ===
    #[error("Transaction #{index} has {confirmations} of {threshold} confirmations")]
    NotEnoughConfirmations {
        index: usize,
        confirmations: usize,
        threshold: usize,
    },

    #[error("Execution of transaction #{index} failed: {source}")]
    ExecutionFailed {
        index: usize,
        #[source]
        source: InvocationError,
    },
}

impl VaultError {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Failure reported by an [`crate::Invoker`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("Target {target} rejected the call: {reason}")]
    Rejected { target: Identity, reason: String },
}

impl InvocationError {
    pub fn rejected(target: &Identity, reason: impl Into<String>) -> Self {
        InvocationError::Rejected {
            target: target.clone(),
            reason: reason.into(),
        }
    }
}

/// Errors rebuilding a vault from journal events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Journal does not start with vault initialization")]
    MissingGenesis,

    #[error("Second vault initialization at seq {sequence}")]
    DuplicateGenesis { sequence: u64 },

    #[error("Event at seq {sequence} rejected: {source}")]
    Rejected {
        sequence: u64,
        #[source]
        source: VaultError,
    },

    #[error("Proposal at seq {sequence} recorded index {recorded}, replay assigned {assigned}")]
    IndexMismatch {
        sequence: u64,
        recorded: usize,
        assigned: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_is_variant_name() {
        let err = VaultError::AlreadyExecuted(4);
        assert_eq!(err.kind(), "AlreadyExecuted");
        assert_eq!(err.to_string(), "Transaction #4 already executed");
    }

    #[test]
    fn test_execution_failure_carries_source() {
        let err = VaultError::ExecutionFailed {
            index: 1,
            source: InvocationError::rejected(&Identity::from("x"), "reverted"),
        };
        assert_eq!(err.kind(), "ExecutionFailed");
        assert!(err.to_string().contains("reverted"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
