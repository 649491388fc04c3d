//! Error taxonomy for every token and multisig operation
//!
//! Each failure carries its own reason and belongs to exactly one
//! [`ErrorKind`]. A failed operation never leaves a partial effect behind.

use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Broad class of a failure, surfaced to callers alongside the reason
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required role (not the owner, not a signer)
    Authorization,
    /// Malformed input or a ledger precondition that does not hold
    Validation,
    /// Operation is invalid for the proposal's current state
    State,
    /// Change would make the signer quorum unreachable
    Invariant,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Authorization => write!(f, "AuthorizationError"),
            ErrorKind::Validation => write!(f, "ValidationError"),
            ErrorKind::State => write!(f, "StateError"),
            ErrorKind::Invariant => write!(f, "InvariantError"),
        }
    }
}

/// Errors returned by ledger, ownership and multisig operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    // -------------------------------------------------------------------------
    // Authorization
    // -------------------------------------------------------------------------
    #[error("caller is not the owner: {0}")]
    NotOwner(Address),
    #[error("caller is not a signer: {0}")]
    NotSigner(Address),
    #[error("direct minting is disabled, propose a multisig mint instead")]
    OwnerMintDisabled,

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------
    #[error("transfer to zero address")]
    TransferToZero,
    #[error("transfer from zero address")]
    TransferFromZero,
    #[error("approve to zero address")]
    ApproveToZero,
    #[error("mint to zero address")]
    MintToZero,
    #[error("new owner is zero address")]
    NewOwnerZero,
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("insufficient balance to burn: have {have}, need {need}")]
    InsufficientBurnBalance { have: u128, need: u128 },
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("total supply overflow: supply {supply}, minting {amount}")]
    SupplyOverflow { supply: u128, amount: u128 },
    #[error("invalid token metadata: {0}")]
    InvalidMetadata(String),
    #[error("signer is zero address")]
    ZeroSigner,
    #[error("at least one signer is required")]
    NoSigners,
    #[error("duplicate signer: {0}")]
    DuplicateSigner(Address),
    #[error("already a signer: {0}")]
    SignerAlreadyExists(Address),
    #[error("not a signer: {0}")]
    SignerNotFound(Address),
    #[error("required signatures must be at least 1, got {0}")]
    InvalidThreshold(usize),
    #[error("transaction does not exist: {0}")]
    UnknownTransaction(u64),

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------
    #[error("transaction {0} already executed")]
    AlreadyExecuted(u64),
    #[error("transaction {id} already confirmed by {signer}")]
    AlreadyConfirmed { id: u64, signer: Address },
    #[error("transaction {id} not confirmed by {signer}")]
    NotConfirmed { id: u64, signer: Address },
    #[error("transaction {id} has not enough confirmations: have {have}, need {need}")]
    NotEnoughConfirmations { id: u64, have: usize, need: usize },

    // -------------------------------------------------------------------------
    // Invariant
    // -------------------------------------------------------------------------
    #[error("required signatures {threshold} exceed signer count {signers}")]
    ThresholdExceedsSigners { threshold: usize, signers: usize },
}

impl TokenError {
    /// Which class of failure this is
    pub fn kind(&self) -> ErrorKind {
        use TokenError::*;

        match self {
            NotOwner(_) | NotSigner(_) | OwnerMintDisabled => ErrorKind::Authorization,

            TransferToZero
            | TransferFromZero
            | ApproveToZero
            | MintToZero
            | NewOwnerZero
            | InsufficientBalance { .. }
            | InsufficientAllowance { .. }
            | InsufficientBurnBalance { .. }
            | InvalidAmount
            | SupplyOverflow { .. }
            | InvalidMetadata(_)
            | ZeroSigner
            | NoSigners
            | DuplicateSigner(_)
            | SignerAlreadyExists(_)
            | SignerNotFound(_)
            | InvalidThreshold(_)
            | UnknownTransaction(_) => ErrorKind::Validation,

            AlreadyExecuted(_)
            | AlreadyConfirmed { .. }
            | NotConfirmed { .. }
            | NotEnoughConfirmations { .. } => ErrorKind::State,

            ThresholdExceedsSigners { .. } => ErrorKind::Invariant,
        }
    }
}

/// Result alias for token operations
pub type TokenResult<T> = Result<T, TokenError>;
