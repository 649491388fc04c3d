//! Applies an approved proposal's effect
//!
//! Dispatch is an exhaustive match over [`ProposalAction`], so a new action
//! kind does not compile until it is handled here. There is no authorization
//! check at this layer: quorum was established by the queue. Validation is
//! whatever the ledger and ownership record enforce themselves.

use crate::core::{Event, TokenResult};
use crate::multisig::transaction::ProposalAction;
use crate::token::{Ledger, OwnershipRecord};

/// Explicit handles to the state a proposal may change
pub struct ExecutionDispatcher<'a> {
    ledger: &'a mut Ledger,
    ownership: &'a mut OwnershipRecord,
}

impl<'a> ExecutionDispatcher<'a> {
    pub fn new(ledger: &'a mut Ledger, ownership: &'a mut OwnershipRecord) -> Self {
        Self { ledger, ownership }
    }

    /// Apply the action, returning the effect's own notification
    pub fn dispatch(&mut self, action: &ProposalAction) -> TokenResult<Event> {
        match action {
            ProposalAction::Mint { target, amount } => self.ledger.mint(target, *amount),
            ProposalAction::TransferOwnership { target } => self.ownership.set(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, TokenError};
    use crate::token::TokenMetadata;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn setup() -> (Ledger, OwnershipRecord) {
        let metadata = TokenMetadata::new("Test".to_string(), "TST".to_string(), 0).unwrap();
        (Ledger::new(metadata), OwnershipRecord::new(addr(1)))
    }

    #[test]
    fn test_dispatch_mint() {
        let (mut ledger, mut ownership) = setup();

        let event = ExecutionDispatcher::new(&mut ledger, &mut ownership)
            .dispatch(&ProposalAction::Mint {
                target: addr(2),
                amount: 500,
            })
            .unwrap();

        assert_eq!(
            event,
            Event::Transfer {
                from: Address::ZERO,
                to: addr(2),
                amount: 500
            }
        );
        assert_eq!(ledger.balance_of(&addr(2)), 500);
        assert_eq!(ledger.total_supply(), 500);
    }

    #[test]
    fn test_dispatch_transfer_ownership() {
        let (mut ledger, mut ownership) = setup();

        let event = ExecutionDispatcher::new(&mut ledger, &mut ownership)
            .dispatch(&ProposalAction::TransferOwnership { target: addr(3) })
            .unwrap();

        assert_eq!(
            event,
            Event::OwnershipTransferred {
                previous_owner: addr(1),
                new_owner: addr(3)
            }
        );
        assert_eq!(ownership.owner(), addr(3));
    }

    #[test]
    fn test_dispatch_surfaces_ledger_validation() {
        let (mut ledger, mut ownership) = setup();

        let result = ExecutionDispatcher::new(&mut ledger, &mut ownership).dispatch(
            &ProposalAction::Mint {
                target: Address::ZERO,
                amount: 1,
            },
        );

        assert_eq!(result, Err(TokenError::MintToZero));
        assert_eq!(ledger.total_supply(), 0);
    }
}
