//! Vault configuration
//!
//! The signer set and threshold a vault is created with, loadable from a
//! JSON file.

use crate::error::VaultError;
use crate::registry::SignerRegistry;
use crate::vault::Vault;
use custody_core::{Identity, MIN_THRESHOLD};
use custody_events::EventSink;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid vault config: {0}")]
    Invalid(#[from] VaultError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Initial signers, in order
    pub signers: Vec<Identity>,

    /// Confirmations required to execute
    #[serde(default = "default_threshold")]
    pub threshold: usize,
}

fn default_threshold() -> usize {
    MIN_THRESHOLD
}

impl VaultConfig {
    pub fn new(signers: Vec<Identity>, threshold: usize) -> Self {
        Self { signers, threshold }
    }

    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the same checks vault construction applies
    pub fn validate(&self) -> Result<(), VaultError> {
        SignerRegistry::initialize(self.signers.clone(), self.threshold).map(|_| ())
    }

    pub fn build<S: EventSink>(self, sink: S) -> Result<Vault<S>, VaultError> {
        Vault::new(self.signers, self.threshold, sink)
    }
}
