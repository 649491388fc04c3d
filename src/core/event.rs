//! Notifications emitted by committed operations

use crate::core::Address;
use crate::multisig::ActionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A notification produced by a successful operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Tokens moved; `from` is zero for mints, `to` is zero for burns
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    /// Allowance set
    Approval {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    /// A privileged action was proposed; `amount` is 0 for ownership transfers
    TransactionProposed {
        id: u64,
        kind: ActionKind,
        target: Address,
        amount: u128,
        proposer: Address,
    },
    TransactionConfirmed { id: u64, signer: Address },
    TransactionRevoked { id: u64, signer: Address },
    TransactionExecuted { id: u64 },
    SignerAdded { signer: Address },
    SignerRemoved { signer: Address },
    RequiredSignaturesChanged { old: usize, new: usize },
}

impl Event {
    /// Short event name, as used in logs and API filters
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
            Event::TransactionProposed { .. } => "TransactionProposed",
            Event::TransactionConfirmed { .. } => "TransactionConfirmed",
            Event::TransactionRevoked { .. } => "TransactionRevoked",
            Event::TransactionExecuted { .. } => "TransactionExecuted",
            Event::SignerAdded { .. } => "SignerAdded",
            Event::SignerRemoved { .. } => "SignerRemoved",
            Event::RequiredSignaturesChanged { .. } => "RequiredSignaturesChanged",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Transfer { from, to, amount } => {
                write!(f, "Transfer {} -> {}: {}", from, to, amount)
            }
            Event::Approval {
                owner,
                spender,
                amount,
            } => write!(f, "Approval {} -> {}: {}", owner, spender, amount),
            Event::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => write!(f, "OwnershipTransferred {} -> {}", previous_owner, new_owner),
            Event::TransactionProposed {
                id,
                kind,
                target,
                amount,
                proposer,
            } => write!(
                f,
                "TransactionProposed #{} {} target={} amount={} by {}",
                id, kind, target, amount, proposer
            ),
            Event::TransactionConfirmed { id, signer } => {
                write!(f, "TransactionConfirmed #{} by {}", id, signer)
            }
            Event::TransactionRevoked { id, signer } => {
                write!(f, "TransactionRevoked #{} by {}", id, signer)
            }
            Event::TransactionExecuted { id } => write!(f, "TransactionExecuted #{}", id),
            Event::SignerAdded { signer } => write!(f, "SignerAdded {}", signer),
            Event::SignerRemoved { signer } => write!(f, "SignerRemoved {}", signer),
            Event::RequiredSignaturesChanged { old, new } => {
                write!(f, "RequiredSignaturesChanged {} -> {}", old, new)
            }
        }
    }
}

/// An event as stored in the contract's notification log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0
    pub seq: u64,
    /// When the emitting operation committed
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}
