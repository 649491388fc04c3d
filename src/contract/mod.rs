//! The deployed token contract
//!
//! Ties the ledger, ownership record and multisig together behind a single
//! caller-aware surface with all-or-nothing operations.
//!
//! # Example
//!
//! ```ignore
//! use fortytwo_token::contract::{TokenConfig, TokenContract};
//!
//! let config = TokenConfig { signers: vec![s1, s2, s3], ..Default::default() };
//! let mut token = TokenContract::deploy(deployer, config)?;
//!
//! token.transfer(&deployer, &alice, 100)?;
//!
//! let (id, _) = token.propose_mint(&s1, &alice, 1_000)?;
//! token.confirm_transaction(&s1, id)?;
//! token.confirm_transaction(&s2, id)?;
//! token.execute_transaction(&s3, id)?;
//! ```

pub mod config;
pub mod token_contract;

pub use config::{ConfigError, TokenConfig, DEFAULT_INITIAL_SUPPLY, DEFAULT_REQUIRED_SIGNATURES};
pub use token_contract::TokenContract;
