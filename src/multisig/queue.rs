//! Proposal log and the multisig state machine
//!
//! ```text
//!   propose ──> Pending ──confirm──> Ready ──execute──> Executed
//!                  ^                   │
//!                  └──revoke / threshold raised
//! ```
//!
//! Proposals are never deleted and ids are never reused. Readiness is always
//! judged against the registry's threshold at the time of the call, not the
//! one in force when the proposal was created.

use crate::core::{Address, Event, TokenError, TokenResult};
use crate::multisig::dispatcher::ExecutionDispatcher;
use crate::multisig::signers::SignerRegistry;
use crate::multisig::transaction::{Proposal, ProposalAction, ProposalStatus};
use serde::{Deserialize, Serialize};

/// Append-only log of proposals, indexed by id
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionQueue {
    transactions: Vec<Proposal>,
}

impl TransactionQueue {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Look up a proposal by id
    pub fn get(&self, id: u64) -> TokenResult<&Proposal> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get(index))
            .ok_or(TokenError::UnknownTransaction(id))
    }

    /// Whether the proposal has at least `threshold` confirmations right now.
    /// Independent of the executed flag.
    pub fn is_confirmed(&self, id: u64, registry: &SignerRegistry) -> TokenResult<bool> {
        Ok(self.get(id)?.confirmations() >= registry.threshold())
    }

    pub fn has_confirmed(&self, id: u64, signer: &Address) -> TokenResult<bool> {
        Ok(self.get(id)?.is_confirmed_by(signer))
    }

    pub fn status(&self, id: u64, registry: &SignerRegistry) -> TokenResult<ProposalStatus> {
        Ok(self.get(id)?.status(registry.threshold()))
    }

    /// Number of proposals ever created (also the next id)
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.transactions.iter()
    }

    /// Proposals that have not been executed yet
    pub fn pending(&self) -> Vec<&Proposal> {
        self.transactions.iter().filter(|tx| !tx.executed).collect()
    }

    // =========================================================================
    // Signer operations
    // =========================================================================

    /// Append a new proposal and return its id with the notification
    pub fn propose(
        &mut self,
        proposer: &Address,
        action: ProposalAction,
        registry: &SignerRegistry,
    ) -> TokenResult<(u64, Event)> {
        registry.require_signer(proposer)?;

        match &action {
            ProposalAction::Mint { target, amount } => {
                if target.is_zero() {
                    return Err(TokenError::MintToZero);
                }
                if *amount == 0 {
                    return Err(TokenError::InvalidAmount);
                }
            }
            ProposalAction::TransferOwnership { target } => {
                if target.is_zero() {
                    return Err(TokenError::NewOwnerZero);
                }
            }
        }

        let id = self.transactions.len() as u64;
        let event = Event::TransactionProposed {
            id,
            kind: action.kind(),
            target: action.target(),
            amount: action.amount(),
            proposer: *proposer,
        };

        log::info!(
            "Transaction {} proposed by {}: {} {} (amount {})",
            id,
            proposer,
            action.kind(),
            action.target(),
            action.amount()
        );
        self.transactions.push(Proposal::new(id, action));

        Ok((id, event))
    }

    /// Record the caller's approval
    pub fn confirm(
        &mut self,
        id: u64,
        caller: &Address,
        registry: &SignerRegistry,
    ) -> TokenResult<Event> {
        registry.require_signer(caller)?;
        let proposal = self.get_open_mut(id)?;

        if !proposal.add_confirmation(*caller) {
            return Err(TokenError::AlreadyConfirmed {
                id,
                signer: *caller,
            });
        }

        log::debug!(
            "Transaction {} confirmed by {} ({}/{})",
            id,
            caller,
            proposal.confirmations(),
            registry.threshold()
        );

        Ok(Event::TransactionConfirmed {
            id,
            signer: *caller,
        })
    }

    /// Withdraw the caller's approval. Allowed at any point before execution,
    /// including after quorum was reached.
    pub fn revoke(
        &mut self,
        id: u64,
        caller: &Address,
        registry: &SignerRegistry,
    ) -> TokenResult<Event> {
        registry.require_signer(caller)?;
        let proposal = self.get_open_mut(id)?;

        if !proposal.remove_confirmation(caller) {
            return Err(TokenError::NotConfirmed {
                id,
                signer: *caller,
            });
        }

        log::debug!(
            "Transaction {} revoked by {} ({}/{})",
            id,
            caller,
            proposal.confirmations(),
            registry.threshold()
        );

        Ok(Event::TransactionRevoked {
            id,
            signer: *caller,
        })
    }

    /// Apply the proposal's effect and mark it executed.
    ///
    /// Returns the effect's notification followed by `TransactionExecuted`.
    /// If the effect fails the proposal stays unexecuted.
    pub fn execute(
        &mut self,
        id: u64,
        caller: &Address,
        registry: &SignerRegistry,
        mut dispatcher: ExecutionDispatcher<'_>,
    ) -> TokenResult<Vec<Event>> {
        registry.require_signer(caller)?;
        let proposal = self.get_open_mut(id)?;

        let need = registry.threshold();
        if proposal.confirmations() < need {
            return Err(TokenError::NotEnoughConfirmations {
                id,
                have: proposal.confirmations(),
                need,
            });
        }

        let effect = dispatcher.dispatch(&proposal.action)?;
        proposal.mark_executed();

        log::info!("Transaction {} executed by {}", id, caller);

        Ok(vec![effect, Event::TransactionExecuted { id }])
    }

    /// Mutable access to a proposal that has not been executed
    fn get_open_mut(&mut self, id: u64) -> TokenResult<&mut Proposal> {
        let proposal = usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get_mut(index))
            .ok_or(TokenError::UnknownTransaction(id))?;

        if proposal.executed {
            return Err(TokenError::AlreadyExecuted(id));
        }

        Ok(proposal)
    }
}
