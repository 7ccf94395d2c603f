//! Application context - wires vault, journal and treasury together

use crate::treasury::Treasury;
use custody_core::{Amount, Identity, Payload};
use custody_events::{verify_chain, ChainError, EventError, JournalReader, JournalStore};
use custody_vault::{ConfigError, ConfirmOutcome, ReplayError, Vault, VaultConfig, VaultError};
use std::path::{Path, PathBuf};

/// Vault whose notifications land in the journal
pub type JournaledVault = Vault<JournalStore>;

/// Application context
///
/// State is rebuilt from the journal on open; every successful operation
/// appends to it.
pub struct AppContext {
    vault: Option<JournaledVault>,
    pub treasury: Treasury,
    journal_path: PathBuf,
}

impl AppContext {
    /// Open the data directory, replaying the journal if there is one
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let journal_path = data_path.as_ref().join("journal");
        std::fs::create_dir_all(&journal_path).map_err(EventError::from)?;

        let records = JournalReader::from_directory(&journal_path)?.read_all()?;
        verify_chain(&records)?;

        let store = JournalStore::open(&journal_path)?;

        let (vault, treasury) = if records.is_empty() {
            (None, Treasury::new())
        } else {
            let vault = Vault::replay(records.iter().map(|r| &r.event), store)?;
            let treasury = Treasury::replay(records.iter().map(|r| &r.event), &vault);
            (Some(vault), treasury)
        };

        tracing::debug!(
            path = %journal_path.display(),
            records = records.len(),
            "Context opened"
        );

        Ok(Self {
            vault,
            treasury,
            journal_path,
        })
    }

    /// Create the vault. Fails if the journal already holds one.
    pub fn init(&mut self, config: VaultConfig) -> Result<&JournaledVault, ContextError> {
        if self.vault.is_some() {
            return Err(ContextError::AlreadyInitialized);
        }

        let store = JournalStore::open(&self.journal_path)?;
        let vault = config.build(store)?;
        self.vault = Some(vault);
        self.sync()?;

        self.vault()
    }

    pub fn is_initialized(&self) -> bool {
        self.vault.is_some()
    }

    pub fn vault(&self) -> Result<&JournaledVault, ContextError> {
        self.vault.as_ref().ok_or(ContextError::NotInitialized)
    }

    fn vault_mut(&mut self) -> Result<&mut JournaledVault, ContextError> {
        self.vault.as_mut().ok_or(ContextError::NotInitialized)
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    // === Operations ===

    pub fn deposit(&mut self, sender: Identity, amount: Amount) -> Result<(), ContextError> {
        let vault = self.vault.as_mut().ok_or(ContextError::NotInitialized)?;
        if !self.treasury.deposit(amount) {
            return Err(ContextError::BalanceOverflow(amount));
        }
        vault.receive(sender, amount);
        self.sync()
    }

    pub fn propose(
        &mut self,
        caller: &Identity,
        target: Identity,
        value: Amount,
        payload: Payload,
    ) -> Result<usize, ContextError> {
        let index = self.vault_mut()?.propose(caller, target, value, payload)?;
        self.sync()?;
        Ok(index)
    }

    pub fn confirm(&mut self, caller: &Identity, index: usize) -> Result<ConfirmOutcome, ContextError> {
        let vault = self.vault.as_mut().ok_or(ContextError::NotInitialized)?;
        let outcome = vault.confirm(caller, index, &mut self.treasury)?;
        self.sync()?;
        Ok(outcome)
    }

    pub fn revoke(&mut self, caller: &Identity, index: usize) -> Result<(), ContextError> {
        self.vault_mut()?.revoke(caller, index)?;
        self.sync()
    }

    pub fn add_signer(&mut self, caller: &Identity, signer: Identity) -> Result<(), ContextError> {
        self.vault_mut()?.add_signer(caller, signer)?;
        self.sync()
    }

    pub fn remove_signer(&mut self, caller: &Identity, signer: &Identity) -> Result<(), ContextError> {
        self.vault_mut()?.remove_signer(caller, signer)?;
        self.sync()
    }

    /// Surface a journal write failure from the last operation
    fn sync(&mut self) -> Result<(), ContextError> {
        match self.vault_mut()?.sink_mut().take_error() {
            Some(e) => Err(ContextError::Journal(e)),
            None => Ok(()),
        }
    }
}

/// Errors from context operations
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Vault not initialized (run `custody init`)")]
    NotInitialized,

    #[error("Vault already initialized")]
    AlreadyInitialized,

    #[error("Deposit of {0} would overflow the vault balance")]
    BalanceOverflow(Amount),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Journal error: {0}")]
    Journal(#[from] EventError),

    #[error("Journal integrity check failed: {0}")]
    Chain(#[from] ChainError),

    #[error("Journal replay failed: {0}")]
    Replay(#[from] ReplayError),
}
