//! ERC-20 style fungible token
//!
//! Provides the bookkeeping half of the system:
//! - Balances, allowances and total supply ([`Ledger`])
//! - The single controlling identity ([`OwnershipRecord`])
//!
//! Neither type knows about the multisig; privileged effects reach them only
//! through the execution dispatcher or a direct owner call.

pub mod ledger;
pub mod ownership;

pub use ledger::{Ledger, TokenMetadata, MAX_DECIMALS};
pub use ownership::OwnershipRecord;
