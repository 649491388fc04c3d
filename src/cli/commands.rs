//! CLI commands for the token
//!
//! Implements all command handlers for the CLI interface. Each mutating
//! command acts as the identity given by `--caller`, saves the new state and
//! prints the notifications it produced.

use crate::contract::{TokenConfig, TokenContract};
use crate::core::{Address, TokenResult};
use crate::storage::{self, Storage, StorageConfig};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub contract: TokenContract,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the deployed token from `data_dir`
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(StorageConfig::in_dir(data_dir.clone()))?;

        if !storage.exists() {
            return Err(format!(
                "No token deployed in {:?}. Run `f42t deploy` first.",
                data_dir
            )
            .into());
        }

        let contract = storage.load()?;

        Ok(Self {
            contract,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.contract)?;
        Ok(())
    }

    /// Run a mutation, then save and print its notifications
    fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut TokenContract) -> TokenResult<T>,
    ) -> CliResult<T> {
        let before = self.contract.events().len() as u64;
        let value = op(&mut self.contract)?;
        self.save()?;

        for record in self.contract.events_since(before) {
            println!("   📣 {}", record.event);
        }

        Ok(value)
    }
}

/// Format a raw amount as whole tokens with the given decimals
pub fn format_units(amount: u128, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let unit = 10u128.pow(decimals as u32);
    let whole = amount / unit;
    let frac = amount % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

// ============================================================================
// Deployment
// ============================================================================

/// Deploy a new token into `data_dir`
pub fn cmd_deploy(
    data_dir: &Path,
    deployer: Address,
    config: TokenConfig,
    force: bool,
) -> CliResult<()> {
    let storage = Storage::new(StorageConfig::in_dir(data_dir))?;

    if storage.exists() && !force {
        println!("⚠️  A token is already deployed at {:?}", data_dir);
        println!("   Use --force to redeploy (this replaces the existing state)");
        return Ok(());
    }

    let contract = TokenContract::deploy(deployer, config)?;
    storage.save(&contract)?;

    println!("✅ Token deployed!");
    print_summary(&contract);
    println!("   📁 Data directory: {:?}", data_dir);

    Ok(())
}

fn print_summary(contract: &TokenContract) {
    println!("   ├─ Address: {}", contract.address);
    println!("   ├─ Name: {}", contract.name());
    println!("   ├─ Symbol: {}", contract.symbol());
    println!("   ├─ Decimals: {}", contract.decimals());
    println!(
        "   ├─ Total supply: {} {}",
        format_units(contract.total_supply(), contract.decimals()),
        contract.symbol()
    );
    println!("   ├─ Owner: {}", contract.owner());
    println!(
        "   ├─ Multisig: {}-of-{}",
        contract.required_signatures(),
        contract.signer_count()
    );
    for signer in contract.signers() {
        println!("   │    └─ {}", signer);
    }
    println!(
        "   └─ Direct owner mint: {}",
        if contract.owner_mint_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );
}

// ============================================================================
// Reads
// ============================================================================

/// Show token information
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    println!("🪙 Token Info");
    print_summary(&state.contract);
    println!(
        "   Holders: {}, proposals: {}, notifications: {}",
        state.contract.holders().len(),
        state.contract.transaction_count(),
        state.contract.events().len()
    );
    Ok(())
}

/// Show a holder's balance
pub fn cmd_balance(state: &AppState, holder: &Address) -> CliResult<()> {
    let balance = state.contract.balance_of(holder);

    println!("💰 Balance for {}", holder);
    println!(
        "   {} {} ({} raw)",
        format_units(balance, state.contract.decimals()),
        state.contract.symbol(),
        balance
    );
    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(state: &AppState, owner: &Address, spender: &Address) -> CliResult<()> {
    let allowance = state.contract.allowance(owner, spender);

    println!("🔓 Allowance {} -> {}", owner, spender);
    println!(
        "   {} {} ({} raw)",
        format_units(allowance, state.contract.decimals()),
        state.contract.symbol(),
        allowance
    );
    Ok(())
}

/// List the largest holders
pub fn cmd_holders(state: &AppState, count: usize) -> CliResult<()> {
    let holders = state.contract.holders();

    println!("📋 Holders ({} total):", holders.len());
    for (address, balance) in holders.iter().take(count) {
        println!(
            "   {} - {}",
            address,
            format_units(*balance, state.contract.decimals())
        );
    }
    if holders.len() > count {
        println!("   ... and {} more", holders.len() - count);
    }
    Ok(())
}

/// Show the signer set and threshold
pub fn cmd_signers(state: &AppState) -> CliResult<()> {
    println!(
        "🔐 Signers ({} required of {}):",
        state.contract.required_signatures(),
        state.contract.signer_count()
    );
    for signer in state.contract.signers() {
        println!("   {}", signer);
    }
    Ok(())
}

/// List proposals
pub fn cmd_transactions(state: &AppState, pending_only: bool) -> CliResult<()> {
    let threshold = state.contract.required_signatures();
    let proposals: Vec<_> = state
        .contract
        .transactions()
        .filter(|p| !pending_only || !p.executed)
        .collect();

    if proposals.is_empty() {
        println!("📭 No proposals");
        return Ok(());
    }

    println!("📜 Proposals:");
    for proposal in proposals {
        println!(
            "   #{} {} target={} amount={} confirmations={}/{} {:?}",
            proposal.id,
            proposal.action.kind(),
            proposal.action.target(),
            proposal.action.amount(),
            proposal.confirmations(),
            threshold,
            proposal.status(threshold)
        );
    }
    Ok(())
}

/// Show one proposal in detail
pub fn cmd_transaction(state: &AppState, id: u64) -> CliResult<()> {
    let proposal = state.contract.get_transaction(id)?;
    let threshold = state.contract.required_signatures();

    println!("📜 Proposal #{}", proposal.id);
    println!("   ├─ Action: {}", proposal.action.kind());
    println!("   ├─ Target: {}", proposal.action.target());
    println!("   ├─ Amount: {}", proposal.action.amount());
    println!("   ├─ Status: {:?}", proposal.status(threshold));
    println!(
        "   └─ Confirmations: {}/{}",
        proposal.confirmations(),
        threshold
    );
    for signer in proposal.confirmers() {
        println!("        └─ {}", signer);
    }
    Ok(())
}

/// Print the notification log from `from` onwards
pub fn cmd_events(state: &AppState, from: u64) -> CliResult<()> {
    let records = state.contract.events_since(from);

    println!("📣 Notifications ({}):", records.len());
    for record in records {
        println!(
            "   [{}] {} {}",
            record.seq,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.event
        );
    }
    Ok(())
}

/// Check the supply and multisig invariants
pub fn cmd_validate(state: &AppState) -> CliResult<()> {
    println!("🔍 Validating token state...");

    let violations = state.contract.check_invariants();
    if violations.is_empty() {
        println!("✅ Token state is consistent!");
        println!(
            "   Supply {} matches the sum of {} balances",
            state.contract.total_supply(),
            state.contract.holders().len()
        );
    } else {
        println!("❌ Token state validation FAILED!");
        for violation in violations {
            println!("   - {}", violation);
        }
    }
    Ok(())
}

// ============================================================================
// Ledger Operations
// ============================================================================

pub fn cmd_transfer(state: &mut AppState, caller: &Address, to: &Address, amount: u128) -> CliResult<()> {
    println!("📤 Transferring {} to {}...", amount, to);
    state.apply(|c| c.transfer(caller, to, amount))?;
    println!("✅ Transfer complete");
    Ok(())
}

pub fn cmd_approve(
    state: &mut AppState,
    caller: &Address,
    spender: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|c| c.approve(caller, spender, amount))?;
    println!("✅ Allowance set");
    Ok(())
}

pub fn cmd_transfer_from(
    state: &mut AppState,
    caller: &Address,
    from: &Address,
    to: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|c| c.transfer_from(caller, from, to, amount))?;
    println!("✅ Transfer complete");
    Ok(())
}

pub fn cmd_burn(state: &mut AppState, caller: &Address, amount: u128) -> CliResult<()> {
    state.apply(|c| c.burn(caller, amount))?;
    println!("🔥 Burned {}", amount);
    Ok(())
}

pub fn cmd_mint(state: &mut AppState, caller: &Address, to: &Address, amount: u128) -> CliResult<()> {
    state.apply(|c| c.mint(caller, to, amount))?;
    println!("✅ Minted {} to {}", amount, to);
    Ok(())
}

pub fn cmd_transfer_ownership(
    state: &mut AppState,
    caller: &Address,
    new_owner: &Address,
) -> CliResult<()> {
    state.apply(|c| c.transfer_ownership(caller, new_owner))?;
    println!("✅ Ownership transferred to {}", new_owner);
    Ok(())
}

// ============================================================================
// Multisig Operations
// ============================================================================

pub fn cmd_propose_mint(
    state: &mut AppState,
    caller: &Address,
    target: &Address,
    amount: u128,
) -> CliResult<()> {
    let (id, _) = state.apply(|c| c.propose_mint(caller, target, amount))?;
    println!("✅ Proposal #{} created", id);
    Ok(())
}

pub fn cmd_propose_ownership(
    state: &mut AppState,
    caller: &Address,
    target: &Address,
) -> CliResult<()> {
    let (id, _) = state.apply(|c| c.propose_transfer_ownership(caller, target))?;
    println!("✅ Proposal #{} created", id);
    Ok(())
}

pub fn cmd_confirm(state: &mut AppState, caller: &Address, id: u64) -> CliResult<()> {
    state.apply(|c| c.confirm_transaction(caller, id))?;

    let proposal = state.contract.get_transaction(id)?;
    println!(
        "✅ Confirmed ({}/{})",
        proposal.confirmations(),
        state.contract.required_signatures()
    );
    Ok(())
}

pub fn cmd_revoke(state: &mut AppState, caller: &Address, id: u64) -> CliResult<()> {
    state.apply(|c| c.revoke_confirmation(caller, id))?;
    println!("✅ Confirmation revoked");
    Ok(())
}

pub fn cmd_execute(state: &mut AppState, caller: &Address, id: u64) -> CliResult<()> {
    state.apply(|c| c.execute_transaction(caller, id))?;
    println!("✅ Proposal #{} executed", id);
    Ok(())
}

pub fn cmd_add_signer(state: &mut AppState, caller: &Address, signer: &Address) -> CliResult<()> {
    state.apply(|c| c.add_signer(caller, signer))?;
    println!("✅ Signer added");
    Ok(())
}

pub fn cmd_remove_signer(
    state: &mut AppState,
    caller: &Address,
    signer: &Address,
) -> CliResult<()> {
    state.apply(|c| c.remove_signer(caller, signer))?;
    println!("✅ Signer removed");
    Ok(())
}

pub fn cmd_set_required(state: &mut AppState, caller: &Address, required: usize) -> CliResult<()> {
    state.apply(|c| c.set_required_signatures(caller, required))?;
    println!("✅ Required signatures set to {}", required);
    Ok(())
}

// ============================================================================
// State Files
// ============================================================================

/// Export the token state to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    storage::save_to_file(&state.contract, path)?;
    println!("📦 Token state exported to {:?}", path);
    Ok(())
}

/// Import token state from a file, replacing the current state
pub fn cmd_import(data_dir: &Path, path: &Path) -> CliResult<()> {
    let contract = storage::load_from_file(path)?;
    let storage = Storage::new(StorageConfig::in_dir(data_dir))?;
    storage.save(&contract)?;

    println!("📥 Token state imported from {:?}", path);
    println!("   {} ({}) at {}", contract.name(), contract.symbol(), contract.address);
    Ok(())
}

/// Restore a backup as the current state
pub fn cmd_restore(state: &mut AppState, index: usize) -> CliResult<()> {
    let available = state.storage.list_backups();
    if !available.contains(&index) {
        println!("❌ Backup {} not found. Available: {:?}", index, available);
        return Ok(());
    }

    state.contract = state.storage.restore_backup(index)?;
    state.save()?;
    println!("♻️  Restored backup {}", index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn deployed(dir: &tempfile::TempDir) -> AppState {
        let config = TokenConfig {
            signers: vec![addr(1), addr(2)],
            ..Default::default()
        };
        cmd_deploy(dir.path(), addr(10), config, false).unwrap();
        AppState::new(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(42_000_000 * 10u128.pow(18), 18), "42000000");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(123, 0), "123");
    }

    #[test]
    fn test_load_without_deploy_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_deploy_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(&dir);
        cmd_transfer(&mut state, &addr(10), &addr(20), 5).unwrap();

        let config = TokenConfig {
            signers: vec![addr(3)],
            ..Default::default()
        };
        cmd_deploy(dir.path(), addr(11), config.clone(), false).unwrap();
        let reloaded = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.contract.owner(), addr(10));

        cmd_deploy(dir.path(), addr(11), config, true).unwrap();
        let reloaded = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.contract.owner(), addr(11));
        assert_eq!(reloaded.contract.balance_of(&addr(20)), 0);
    }

    #[test]
    fn test_commands_persist_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(&dir);

        cmd_propose_mint(&mut state, &addr(1), &addr(30), 77).unwrap();
        cmd_confirm(&mut state, &addr(1), 0).unwrap();
        cmd_confirm(&mut state, &addr(2), 0).unwrap();

        let mut state = AppState::new(dir.path().to_path_buf()).unwrap();
        cmd_execute(&mut state, &addr(2), 0).unwrap();

        let state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.contract.balance_of(&addr(30)), 77);
        assert!(state.contract.get_transaction(0).unwrap().executed);
    }

    #[test]
    fn test_failed_command_leaves_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(&dir);

        assert!(cmd_transfer(&mut state, &addr(20), &addr(21), 1).is_err());
        assert!(cmd_add_signer(&mut state, &addr(1), &addr(5)).is_err());

        let state = AppState::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.contract.signer_count(), 2);
        assert_eq!(state.contract.balance_of(&addr(21)), 0);
    }

    #[test]
    fn test_export_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(&dir);
        cmd_transfer(&mut state, &addr(10), &addr(20), 9).unwrap();

        let export = dir.path().join("export.json");
        cmd_export(&state, &export).unwrap();

        let other = tempfile::tempdir().unwrap();
        cmd_import(other.path(), &export).unwrap();
        let imported = AppState::new(other.path().to_path_buf()).unwrap();
        assert_eq!(imported.contract.balance_of(&addr(20)), 9);
    }

    #[test]
    fn test_restore_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = deployed(&dir);
        cmd_transfer(&mut state, &addr(10), &addr(20), 9).unwrap();

        cmd_restore(&mut state, 0).unwrap();
        assert_eq!(state.contract.balance_of(&addr(20)), 0);
    }
}
