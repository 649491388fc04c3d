//! Forty Two Token: a fungible token governed by an N-of-M multisig
//!
//! This crate provides:
//! - An ERC-20 style ledger (balances, allowances, burn)
//! - A single owner that manages the signer set and threshold
//! - A multisig queue through which privileged actions (minting, ownership
//!   transfer) are proposed, confirmed and executed exactly once
//! - An all-or-nothing contract facade with a notification log
//! - JSON persistence with rotating backups
//! - A REST API with WebSocket notifications, and a CLI
//!
//! # Example
//!
//! ```rust
//! use fortytwo_token::contract::{TokenConfig, TokenContract};
//! use fortytwo_token::core::Address;
//!
//! let deployer = Address::new([10u8; 20]);
//! let signers: Vec<Address> = (1..=3).map(|n| Address::new([n; 20])).collect();
//!
//! let config = TokenConfig {
//!     signers: signers.clone(),
//!     ..Default::default()
//! };
//! let mut token = TokenContract::deploy(deployer, config).unwrap();
//!
//! // Mint through the 2-of-3 multisig
//! let (id, _) = token.propose_mint(&signers[0], &signers[0], 1000).unwrap();
//! token.confirm_transaction(&signers[0], id).unwrap();
//! token.confirm_transaction(&signers[1], id).unwrap();
//! token.execute_transaction(&signers[2], id).unwrap();
//!
//! assert_eq!(token.balance_of(&signers[0]), 1000);
//! ```

pub mod api;
pub mod cli;
pub mod contract;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use contract::{TokenConfig, TokenContract};
pub use core::{Address, ErrorKind, Event, TokenError, TokenResult};
pub use multisig::{Proposal, ProposalAction, ProposalStatus, SignerRegistry, TransactionQueue};
pub use storage::Storage;
pub use token::{Ledger, OwnershipRecord, TokenMetadata};
