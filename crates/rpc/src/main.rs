//! Custody CLI - Main entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use custody_core::{Amount, Identity};
use custody_rpc::{commands, AppContext};
use custody_vault::VaultConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "custody")]
#[command(about = "Custody - multi-signature vault", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, env = "CUSTODY_DATA", default_value = "./data")]
    data: PathBuf,

    /// Identity performing the operation
    #[arg(long = "as", global = true)]
    caller: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault
    Init {
        /// Initial signer (repeat for each signer)
        #[arg(long = "signer", required_unless_present = "config")]
        signers: Vec<String>,
        /// Confirmations required to execute
        #[arg(long, default_value_t = 2, conflicts_with = "config")]
        threshold: usize,
        /// JSON config file with `signers` and `threshold`
        #[arg(long, conflicts_with = "signers")]
        config: Option<PathBuf>,
    },

    /// Send value into the vault (no authorization required)
    Deposit {
        /// Sender identity
        from: String,
        /// Amount to deposit
        amount: Amount,
    },

    /// Propose a transaction
    Propose {
        /// Target identity
        target: String,
        /// Value to transfer on execution
        value: Amount,
        /// Hex-encoded call payload
        #[arg(long)]
        payload: Option<String>,
    },

    /// Confirm a transaction (executes on quorum)
    Confirm {
        /// Transaction index
        index: usize,
    },

    /// Revoke a confirmation
    Revoke {
        /// Transaction index
        index: usize,
    },

    /// Add a signer
    AddSigner {
        /// New signer identity
        signer: String,
    },

    /// Remove a signer (reorders the signer list)
    RemoveSigner {
        /// Signer to remove
        signer: String,
    },

    /// List signers
    Signers,

    /// Show a transaction
    Show {
        /// Transaction index
        index: usize,
    },

    /// List transactions
    List,

    /// Show vault or payee balance
    Balance {
        /// Payee identity
        identity: Option<String>,
    },

    /// Audit the journal (verify hash chain)
    Audit,
}

fn caller(cli_caller: &Option<String>) -> anyhow::Result<Identity> {
    cli_caller
        .as_deref()
        .map(Identity::from)
        .context("this command requires --as <identity>")
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut ctx = AppContext::open(&cli.data)?;

    match cli.command {
        Commands::Init {
            signers,
            threshold,
            config,
        } => {
            let config = match config {
                Some(path) => VaultConfig::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => VaultConfig::new(signers.into_iter().map(Identity::from).collect(), threshold),
            };
            commands::init(&mut ctx, config)?;
        }

        Commands::Deposit { from, amount } => {
            commands::deposit(&mut ctx, &from, amount)?;
        }

        Commands::Propose {
            target,
            value,
            payload,
        } => {
            let caller = caller(&cli.caller)?;
            commands::propose(&mut ctx, &caller, &target, value, payload.as_deref())?;
        }

        Commands::Confirm { index } => {
            let caller = caller(&cli.caller)?;
            commands::confirm(&mut ctx, &caller, index)?;
        }

        Commands::Revoke { index } => {
            let caller = caller(&cli.caller)?;
            commands::revoke(&mut ctx, &caller, index)?;
        }

        Commands::AddSigner { signer } => {
            let caller = caller(&cli.caller)?;
            commands::add_signer(&mut ctx, &caller, &signer)?;
        }

        Commands::RemoveSigner { signer } => {
            let caller = caller(&cli.caller)?;
            commands::remove_signer(&mut ctx, &caller, &signer)?;
        }

        Commands::Signers => commands::signers(&ctx)?,

        Commands::Show { index } => commands::show(&ctx, index)?,

        Commands::List => commands::list(&ctx)?,

        Commands::Balance { identity } => commands::balance(&ctx, identity.as_deref())?,

        Commands::Audit => commands::audit(&ctx)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_init_threshold_and_config_conflict() {
        let result = Cli::try_parse_from([
            "custody", "init", "--config", "vault.json", "--threshold", "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_init_from_config_keeps_default_threshold() {
        let cli = Cli::try_parse_from(["custody", "init", "--config", "vault.json"]).unwrap();
        match cli.command {
            Commands::Init { signers, config, .. } => {
                assert!(signers.is_empty());
                assert_eq!(config, Some(PathBuf::from("vault.json")));
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn test_init_from_signers() {
        let cli = Cli::try_parse_from([
            "custody", "init", "--signer", "alice", "--signer", "bob", "--signer", "carol", "--threshold", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Init { signers, threshold, config } => {
                assert_eq!(signers, vec!["alice", "bob", "carol"]);
                assert_eq!(threshold, 3);
                assert!(config.is_none());
            }
            _ => panic!("expected init"),
        }
    }
}
