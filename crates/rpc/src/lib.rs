//! Custody RPC - CLI orchestrator
//!
//! This crate provides the `custody` binary and the context that wires a
//! vault to its journal and treasury.

pub mod commands;
pub mod context;
pub mod treasury;

pub use context::{AppContext, ContextError};
pub use treasury::Treasury;
