//! Single controlling identity

use crate::core::{Address, Event, TokenError, TokenResult};
use serde::{Deserialize, Serialize};

/// Holds the current owner (controller) of the token
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnershipRecord {
    owner: Address,
}

impl OwnershipRecord {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// Current owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, who: &Address) -> bool {
        self.owner == *who
    }

    /// Capability check for controller-only operations
    pub fn require_owner(&self, caller: &Address) -> TokenResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(TokenError::NotOwner(*caller))
        }
    }

    /// Direct transfer initiated by the current owner
    pub fn transfer(&mut self, caller: &Address, new_owner: &Address) -> TokenResult<Event> {
        self.require_owner(caller)?;
        self.set(new_owner)
    }

    /// Replace the owner without a caller check. Used by the multisig
    /// dispatcher once a proposal has reached quorum.
    pub fn set(&mut self, new_owner: &Address) -> TokenResult<Event> {
        if new_owner.is_zero() {
            return Err(TokenError::NewOwnerZero);
        }

        let previous_owner = std::mem::replace(&mut self.owner, *new_owner);
        log::info!("Ownership transferred: {} -> {}", previous_owner, new_owner);

        Ok(Event::OwnershipTransferred {
            previous_owner,
            new_owner: *new_owner,
        })
    }
}
