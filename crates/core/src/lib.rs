//! Custody Core - Domain types
//!
//! This crate contains the fundamental types shared by the vault crates:
//! - `Identity`: Opaque token naming a signer or an invocation target
//! - `Amount`: Non-negative decimal wrapper for transferred value
//! - `Payload`: Opaque call data attached to a proposed transaction

pub mod amount;
pub mod identity;
pub mod payload;

pub use amount::{Amount, AmountError};
pub use identity::Identity;
pub use payload::{Payload, PayloadError};

/// Smallest signer set a vault may ever hold.
pub const MIN_SIGNERS: usize = 3;

/// Smallest quorum threshold a vault may be constructed with.
pub const MIN_THRESHOLD: usize = 2;
