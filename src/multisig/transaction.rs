//! Proposed privileged actions and their approval state

use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Numeric kind tag carried in notifications
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Mint = 0,
    TransferOwnership = 1,
}

impl ActionKind {
    /// Wire tag (0 = mint, 1 = ownership transfer)
    pub fn tag(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Mint => write!(f, "Mint"),
            ActionKind::TransferOwnership => write!(f, "TransferOwnership"),
        }
    }
}

/// The privileged effect a proposal applies once executed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalAction {
    /// Create `amount` new tokens for `target`
    Mint { target: Address, amount: u128 },
    /// Hand control of the token to `target`
    TransferOwnership { target: Address },
}

impl ProposalAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ProposalAction::Mint { .. } => ActionKind::Mint,
            ProposalAction::TransferOwnership { .. } => ActionKind::TransferOwnership,
        }
    }

    pub fn target(&self) -> Address {
        match self {
            ProposalAction::Mint { target, .. } => *target,
            ProposalAction::TransferOwnership { target } => *target,
        }
    }

    /// Mint amount; 0 for actions that carry none
    pub fn amount(&self) -> u128 {
        match self {
            ProposalAction::Mint { amount, .. } => *amount,
            ProposalAction::TransferOwnership { .. } => 0,
        }
    }
}

/// Where a proposal sits in its lifecycle, given the live threshold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Fewer confirmations than the current threshold
    Pending,
    /// Enough confirmations, not yet executed
    Ready,
    /// Effect applied; terminal
    Executed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalStatus::Pending => write!(f, "pending"),
            ProposalStatus::Ready => write!(f, "ready"),
            ProposalStatus::Executed => write!(f, "executed"),
        }
    }
}

/// A proposal in the append-only transaction log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    /// Sequential id, equal to the proposal's index in the log
    pub id: u64,
    pub action: ProposalAction,
    /// One-way flag: once true the proposal never changes again
    pub executed: bool,
    confirmers: BTreeSet<Address>,
}

impl Proposal {
    pub(crate) fn new(id: u64, action: ProposalAction) -> Self {
        Self {
            id,
            action,
            executed: false,
            confirmers: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn target(&self) -> Address {
        self.action.target()
    }

    pub fn amount(&self) -> u128 {
        self.action.amount()
    }

    /// Number of distinct signers currently confirming
    pub fn confirmations(&self) -> usize {
        self.confirmers.len()
    }

    /// Signers currently confirming, in address order
    pub fn confirmers(&self) -> Vec<Address> {
        self.confirmers.iter().copied().collect()
    }

    pub fn is_confirmed_by(&self, signer: &Address) -> bool {
        self.confirmers.contains(signer)
    }

    /// Lifecycle state against the given threshold
    pub fn status(&self, threshold: usize) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if self.confirmations() >= threshold {
            ProposalStatus::Ready
        } else {
            ProposalStatus::Pending
        }
    }

    /// Returns false if the signer had already confirmed
    pub(crate) fn add_confirmation(&mut self, signer: Address) -> bool {
        self.confirmers.insert(signer)
    }

    /// Returns false if the signer had not confirmed
    pub(crate) fn remove_confirmation(&mut self, signer: &Address) -> bool {
        self.confirmers.remove(signer)
    }

    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
    }
}
