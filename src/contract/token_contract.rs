//! The deployed token: ledger, ownership and multisig behind one surface
//!
//! Every public mutating method takes the calling identity as attested by the
//! host and runs inside [`TokenContract::atomically`]: the state is
//! snapshotted first and restored if any check fails, and notifications from
//! a failed call are dropped. Callers sharing a contract across threads must
//! serialize mutations (the API server keeps it behind one `RwLock`).

use crate::contract::config::TokenConfig;
use crate::core::{Address, Event, EventRecord, TokenError, TokenResult};
use crate::multisig::{
    ExecutionDispatcher, Proposal, ProposalAction, ProposalStatus, SignerRegistry,
    TransactionQueue,
};
use crate::token::{Ledger, OwnershipRecord, TokenMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything an operation may change. Cloned as the rollback snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ContractState {
    ledger: Ledger,
    ownership: OwnershipRecord,
    signers: SignerRegistry,
    queue: TransactionQueue,
    owner_mint_enabled: bool,
}

/// A deployed multisig-governed token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenContract {
    /// Contract address, derived from deployer and symbol
    pub address: Address,
    /// Deployment timestamp
    pub deployed_at: DateTime<Utc>,
    state: ContractState,
    /// Notification log, in commit order
    events: Vec<EventRecord>,
}

impl TokenContract {
    /// Deploy a new token
    ///
    /// The whole initial supply is credited to `deployer`, who also becomes
    /// the owner. Signers are de-duplicated and the required count clamped to
    /// the unique signer count before the registry invariants are checked.
    pub fn deploy(deployer: Address, config: TokenConfig) -> TokenResult<Self> {
        if deployer.is_zero() {
            return Err(TokenError::NewOwnerZero);
        }

        let (unique, required) = config.effective_signers();
        let metadata = TokenMetadata::new(config.name, config.symbol, config.decimals)?;
        let supply = config
            .initial_supply
            .checked_mul(metadata.unit())
            .ok_or(TokenError::SupplyOverflow {
                supply: config.initial_supply,
                amount: metadata.unit(),
            })?;

        let signers = SignerRegistry::new(unique, required)?;

        let address = Address::derive(format!("{}:{}", deployer, metadata.symbol).as_bytes());
        let mut ledger = Ledger::new(metadata);

        let mut emitted = vec![Event::OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: deployer,
        }];
        if supply > 0 {
            emitted.push(ledger.mint(&deployer, supply)?);
        }
        emitted.extend(
            signers
                .signers()
                .into_iter()
                .map(|signer| Event::SignerAdded { signer }),
        );

        let mut contract = Self {
            address,
            deployed_at: Utc::now(),
            state: ContractState {
                ledger,
                ownership: OwnershipRecord::new(deployer),
                signers,
                queue: TransactionQueue::new(),
                owner_mint_enabled: config.owner_mint_enabled,
            },
            events: Vec::new(),
        };
        contract.commit(&emitted);

        log::info!(
            "Token deployed: {} ({}) at {}, owner {}, multisig {}",
            contract.name(),
            contract.symbol(),
            contract.address,
            deployer,
            contract.state.signers.description()
        );

        Ok(contract)
    }

    // =========================================================================
    // Token views
    // =========================================================================

    pub fn name(&self) -> &str {
        self.state.ledger.name()
    }

    pub fn symbol(&self) -> &str {
        self.state.ledger.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.state.ledger.decimals()
    }

    pub fn total_supply(&self) -> u128 {
        self.state.ledger.total_supply()
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.state.ledger.balance_of(holder)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.state.ledger.allowance(owner, spender)
    }

    pub fn holders(&self) -> Vec<(Address, u128)> {
        self.state.ledger.holders()
    }

    pub fn owner(&self) -> Address {
        self.state.ownership.owner()
    }

    pub fn owner_mint_enabled(&self) -> bool {
        self.state.owner_mint_enabled
    }

    // =========================================================================
    // Multisig views
    // =========================================================================

    pub fn is_signer(&self, who: &Address) -> bool {
        self.state.signers.is_signer(who)
    }

    pub fn signer_count(&self) -> usize {
        self.state.signers.signer_count()
    }

    pub fn signers(&self) -> Vec<Address> {
        self.state.signers.signers()
    }

    pub fn required_signatures(&self) -> usize {
        self.state.signers.threshold()
    }

    pub fn get_transaction(&self, id: u64) -> TokenResult<&Proposal> {
        self.state.queue.get(id)
    }

    /// Confirmations meet the current threshold (regardless of execution)
    pub fn is_confirmed(&self, id: u64) -> TokenResult<bool> {
        self.state.queue.is_confirmed(id, &self.state.signers)
    }

    pub fn has_confirmed(&self, id: u64, signer: &Address) -> TokenResult<bool> {
        self.state.queue.has_confirmed(id, signer)
    }

    pub fn transaction_status(&self, id: u64) -> TokenResult<ProposalStatus> {
        self.state.queue.status(id, &self.state.signers)
    }

    pub fn transaction_count(&self) -> usize {
        self.state.queue.len()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Proposal> {
        self.state.queue.iter()
    }

    pub fn pending_transactions(&self) -> Vec<&Proposal> {
        self.state.queue.pending()
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Records with `seq >= from`
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.events.len());
        &self.events[start..]
    }

    // =========================================================================
    // Ledger operations
    // =========================================================================

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: u128) -> TokenResult<Vec<Event>> {
        self.atomically("transfer", |state, emitted| {
            emitted.push(state.ledger.transfer(caller, to, amount)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: u128,
    ) -> TokenResult<Vec<Event>> {
        self.atomically("approve", |state, emitted| {
            emitted.push(state.ledger.approve(caller, spender, amount)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<Vec<Event>> {
        self.atomically("transfer_from", |state, emitted| {
            emitted.push(state.ledger.transfer_from(caller, from, to, amount)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    /// Direct owner mint. Only available when enabled at deployment.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: u128) -> TokenResult<Vec<Event>> {
        self.atomically("mint", |state, emitted| {
            state.ownership.require_owner(caller)?;
            if !state.owner_mint_enabled {
                return Err(TokenError::OwnerMintDisabled);
            }
            emitted.push(state.ledger.mint(to, amount)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    /// Burn from the caller's own balance
    pub fn burn(&mut self, caller: &Address, amount: u128) -> TokenResult<Vec<Event>> {
        self.atomically("burn", |state, emitted| {
            emitted.push(state.ledger.burn(caller, amount)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: &Address,
    ) -> TokenResult<Vec<Event>> {
        self.atomically("transfer_ownership", |state, emitted| {
            emitted.push(state.ownership.transfer(caller, new_owner)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    // =========================================================================
    // Multisig operations
    // =========================================================================

    /// Propose minting `amount` to `target`; returns the new proposal id
    pub fn propose_mint(
        &mut self,
        caller: &Address,
        target: &Address,
        amount: u128,
    ) -> TokenResult<(u64, Vec<Event>)> {
        self.propose(
            caller,
            ProposalAction::Mint {
                target: *target,
                amount,
            },
        )
    }

    /// Propose handing ownership to `target`; returns the new proposal id
    pub fn propose_transfer_ownership(
        &mut self,
        caller: &Address,
        target: &Address,
    ) -> TokenResult<(u64, Vec<Event>)> {
        self.propose(caller, ProposalAction::TransferOwnership { target: *target })
    }

    fn propose(&mut self, caller: &Address, action: ProposalAction) -> TokenResult<(u64, Vec<Event>)> {
        self.atomically("propose", |state, emitted| {
            let (id, event) = state.queue.propose(caller, action, &state.signers)?;
            emitted.push(event);
            Ok(id)
        })
    }

    pub fn confirm_transaction(&mut self, caller: &Address, id: u64) -> TokenResult<Vec<Event>> {
        self.atomically("confirm_transaction", |state, emitted| {
            emitted.push(state.queue.confirm(id, caller, &state.signers)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn revoke_confirmation(&mut self, caller: &Address, id: u64) -> TokenResult<Vec<Event>> {
        self.atomically("revoke_confirmation", |state, emitted| {
            emitted.push(state.queue.revoke(id, caller, &state.signers)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn execute_transaction(&mut self, caller: &Address, id: u64) -> TokenResult<Vec<Event>> {
        self.atomically("execute_transaction", |state, emitted| {
            let dispatcher = ExecutionDispatcher::new(&mut state.ledger, &mut state.ownership);
            emitted.extend(state.queue.execute(id, caller, &state.signers, dispatcher)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn add_signer(&mut self, caller: &Address, signer: &Address) -> TokenResult<Vec<Event>> {
        self.atomically("add_signer", |state, emitted| {
            emitted.push(state.signers.add_signer(caller, signer, &state.ownership)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn remove_signer(&mut self, caller: &Address, signer: &Address) -> TokenResult<Vec<Event>> {
        self.atomically("remove_signer", |state, emitted| {
            emitted.push(state.signers.remove_signer(caller, signer, &state.ownership)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    pub fn set_required_signatures(
        &mut self,
        caller: &Address,
        required: usize,
    ) -> TokenResult<Vec<Event>> {
        self.atomically("set_required_signatures", |state, emitted| {
            emitted.push(state.signers.set_threshold(caller, required, &state.ownership)?);
            Ok(())
        })
        .map(|(_, events)| events)
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Check the global invariants. Returns a description of each violation.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        match self.state.ledger.sum_of_balances() {
            Some(sum) if sum == self.total_supply() => {}
            Some(sum) => violations.push(format!(
                "sum of balances {} != total supply {}",
                sum,
                self.total_supply()
            )),
            None => violations.push("sum of balances overflows".to_string()),
        }

        let threshold = self.required_signatures();
        if threshold < 1 || threshold > self.signer_count() {
            violations.push(format!(
                "threshold {} outside 1..={}",
                threshold,
                self.signer_count()
            ));
        }

        for (index, proposal) in self.transactions().enumerate() {
            if proposal.id != index as u64 {
                violations.push(format!(
                    "transaction at index {} has id {}",
                    index, proposal.id
                ));
            }
            if proposal.confirmations() != proposal.confirmers().len() {
                violations.push(format!(
                    "transaction {} confirmation count out of sync",
                    proposal.id
                ));
            }
        }

        violations
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run `op` against the state, all or nothing.
    ///
    /// Rollback restores a full clone of the state, so every operation costs
    /// time proportional to the number of holders, allowances and proposals.
    /// That is accepted at this scale in exchange for exact rollback.
    fn atomically<T, F>(&mut self, name: &str, op: F) -> TokenResult<(T, Vec<Event>)>
    where
        F: FnOnce(&mut ContractState, &mut Vec<Event>) -> TokenResult<T>,
    {
        let snapshot = self.state.clone();
        let mut emitted = Vec::new();

        match op(&mut self.state, &mut emitted) {
            Ok(value) => {
                self.commit(&emitted);
                Ok((value, emitted))
            }
            Err(err) => {
                self.state = snapshot;
                log::warn!("{} rejected ({}): {}", name, err.kind(), err);
                Err(err)
            }
        }
    }

    /// Append committed notifications to the log
    fn commit(&mut self, emitted: &[Event]) {
        let timestamp = Utc::now();
        for event in emitted {
            log::debug!("Event: {:?}", event);
            self.events.push(EventRecord {
                seq: self.events.len() as u64,
                timestamp,
                event: event.clone(),
            });
        }
    }
}
