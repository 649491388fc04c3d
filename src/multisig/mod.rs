//! N-of-M authorization for privileged token operations
//!
//! Signers propose privileged actions, confirm or revoke them, and any
//! signer executes once confirmations reach the current threshold.
//!
//! # Example
//!
//! ```ignore
//! use fortytwo_token::multisig::{ProposalAction, SignerRegistry, TransactionQueue};
//!
//! // 2-of-3
//! let registry = SignerRegistry::new(vec![s1, s2, s3], 2)?;
//! let mut queue = TransactionQueue::new();
//!
//! let (id, _) = queue.propose(&s1, ProposalAction::Mint { target: s1, amount: 1000 }, &registry)?;
//! queue.confirm(id, &s1, &registry)?;
//! queue.confirm(id, &s2, &registry)?;
//!
//! // Ready to execute
//! assert!(queue.is_confirmed(id, &registry)?);
//! ```

pub mod dispatcher;
pub mod queue;
pub mod signers;
pub mod transaction;

pub use dispatcher::ExecutionDispatcher;
pub use queue::TransactionQueue;
pub use signers::SignerRegistry;
pub use transaction::{ActionKind, Proposal, ProposalAction, ProposalStatus};
