//! CLI commands

use custody_core::{Amount, Identity, Payload};
use custody_events::{verify_chain, JournalReader};
use custody_vault::{ConfirmOutcome, VaultConfig};

use crate::context::AppContext;

/// Create the vault from a signer list or a config file
pub fn init(ctx: &mut AppContext, config: VaultConfig) -> Result<(), anyhow::Error> {
    let vault = ctx.init(config)?;

    println!(
        "✅ Vault initialized: {} signers, {} confirmations required",
        vault.signer_count(),
        vault.threshold()
    );
    Ok(())
}

pub fn deposit(ctx: &mut AppContext, sender: &str, amount: Amount) -> Result<(), anyhow::Error> {
    ctx.deposit(Identity::from(sender), amount)?;

    println!(
        "✅ Received {} from {} (vault balance: {})",
        amount,
        sender,
        ctx.treasury.vault_balance()
    );
    Ok(())
}

pub fn propose(
    ctx: &mut AppContext,
    caller: &Identity,
    target: &str,
    value: Amount,
    payload: Option<&str>,
) -> Result<(), anyhow::Error> {
    let payload = match payload {
        Some(hex) => Payload::from_hex(hex)?,
        None => Payload::empty(),
    };
    let index = ctx.propose(caller, Identity::from(target), value, payload)?;

    println!("✅ Proposed transaction #{}: {} to {}", index, value, target);
    Ok(())
}

pub fn confirm(ctx: &mut AppContext, caller: &Identity, index: usize) -> Result<(), anyhow::Error> {
    match ctx.confirm(caller, index)? {
        ConfirmOutcome::Pending { confirmations } => {
            let threshold = ctx.vault()?.threshold();
            println!(
                "✅ {} confirmed #{} ({}/{})",
                caller, index, confirmations, threshold
            );
        }
        ConfirmOutcome::Executed => {
            println!("✅ {} confirmed #{}: quorum reached, executed", caller, index);
        }
    }
    Ok(())
}

pub fn revoke(ctx: &mut AppContext, caller: &Identity, index: usize) -> Result<(), anyhow::Error> {
    ctx.revoke(caller, index)?;

    println!("✅ {} revoked confirmation of #{}", caller, index);
    Ok(())
}

pub fn add_signer(ctx: &mut AppContext, caller: &Identity, signer: &str) -> Result<(), anyhow::Error> {
    ctx.add_signer(caller, Identity::from(signer))?;

    println!("✅ Added signer {}", signer);
    Ok(())
}

pub fn remove_signer(ctx: &mut AppContext, caller: &Identity, signer: &str) -> Result<(), anyhow::Error> {
    ctx.remove_signer(caller, &Identity::from(signer))?;

    println!("✅ Removed signer {}", signer);
    Ok(())
}

pub fn signers(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let vault = ctx.vault()?;

    println!(
        "Signers ({}, threshold {}):",
        vault.signer_count(),
        vault.threshold()
    );
    for signer in vault.signers() {
        println!("  {}", signer);
    }
    Ok(())
}

pub fn show(ctx: &AppContext, index: usize) -> Result<(), anyhow::Error> {
    let vault = ctx.vault()?;
    let record = vault.transaction(index)?;
    let confirmed_by: Vec<String> = vault
        .confirmed_by(index)?
        .iter()
        .map(|s| s.to_string())
        .collect();

    println!("Transaction #{}", index);
    println!("  target:        {}", record.target());
    println!("  value:         {}", record.value());
    println!("  payload:       {} ({} bytes)", record.payload(), record.payload().len());
    println!("  executed:      {}", record.executed());
    println!(
        "  confirmations: {}/{} [{}]",
        record.confirmations(),
        vault.threshold(),
        confirmed_by.join(", ")
    );
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let vault = ctx.vault()?;

    if vault.transaction_count() == 0 {
        println!("No transactions");
        return Ok(());
    }

    println!("{:<6} {:<20} {:>14} {:>8}  {}", "INDEX", "TARGET", "VALUE", "CONFIRM", "STATUS");
    for (index, record) in vault.transactions() {
        let status = if record.executed() { "executed" } else { "pending" };
        println!(
            "{:<6} {:<20} {:>14} {:>8}  {}",
            index,
            record.target().to_string(),
            record.value().to_string(),
            format!("{}/{}", record.confirmations(), vault.threshold()),
            status
        );
    }
    Ok(())
}

pub fn balance(ctx: &AppContext, identity: Option<&str>) -> Result<(), anyhow::Error> {
    ctx.vault()?;

    match identity {
        Some(id) => {
            let amount = ctx.treasury.balance_of(&Identity::from(id));
            println!("Balance for {}: {}", id, amount);
        }
        None => {
            println!("Vault balance: {}", ctx.treasury.vault_balance());
            for (payee, amount) in ctx.treasury.payees() {
                println!("  paid to {}: {}", payee, amount);
            }
        }
    }
    Ok(())
}

/// Verify the journal hash chain
pub fn audit(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let reader = JournalReader::from_directory(ctx.journal_path())?;
    let records = reader.read_all()?;

    match verify_chain(&records) {
        Ok(()) => println!(
            "✅ Hash chain verified ({} records in {} files)",
            records.len(),
            reader.files().len()
        ),
        Err(e) => anyhow::bail!("❌ Hash chain broken: {}", e),
    }
    Ok(())
}
