//! Fungible token ledger
//!
//! Balances, allowances and total supply. Every mutating method checks all
//! of its preconditions before touching state, so a failed call leaves the
//! ledger exactly as it was.

use crate::core::{Address, Event, TokenError, TokenResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum supported decimal places
pub const MAX_DECIMALS: u8 = 18;

/// Token metadata (immutable after deployment)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token name (e.g., "Forty Two Token")
    pub name: String,
    /// Token symbol (e.g., "F42T")
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(name: String, symbol: String, decimals: u8) -> TokenResult<Self> {
        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidMetadata(
                "name must be 1-50 characters".to_string(),
            ));
        }

        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidMetadata(
                "symbol must be 1-10 characters".to_string(),
            ));
        }

        if decimals > MAX_DECIMALS {
            return Err(TokenError::InvalidMetadata(format!(
                "decimals must be 0-{}",
                MAX_DECIMALS
            )));
        }

        Ok(Self {
            name,
            symbol,
            decimals,
        })
    }

    /// Number of base units in one whole token
    pub fn unit(&self) -> u128 {
        10u128.pow(self.decimals as u32)
    }
}

/// Balances and allowances for a single token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    pub metadata: TokenMetadata,
    total_supply: u128,
    /// Balances: holder -> amount
    balances: HashMap<Address, u128>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<Address, HashMap<Address, u128>>,
}

impl Ledger {
    /// Create an empty ledger with zero supply
    pub fn new(metadata: TokenMetadata) -> Self {
        Self {
            metadata,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Get allowance granted by `owner` to `spender`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// All holders with a non-zero balance, largest first
    pub fn holders(&self) -> Vec<(Address, u128)> {
        let mut holders: Vec<(Address, u128)> = self
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, b)| (*a, *b))
            .collect();
        holders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        holders
    }

    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Sum of every balance, `None` on overflow. Equals `total_supply` in
    /// every reachable state.
    pub fn sum_of_balances(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |sum, balance| sum.checked_add(*balance))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Move `amount` from `from` to `to`
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> TokenResult<Event> {
        if from.is_zero() {
            return Err(TokenError::TransferFromZero);
        }
        if to.is_zero() {
            return Err(TokenError::TransferToZero);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        self.move_balance(from, to, amount);

        Ok(Event::Transfer {
            from: *from,
            to: *to,
            amount,
        })
    }

    /// Set the allowance `spender` may move out of `owner`'s balance.
    /// Overwrites any previous allowance; zero revokes it.
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> TokenResult<Event> {
        if spender.is_zero() {
            return Err(TokenError::ApproveToZero);
        }

        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);

        Ok(Event::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        })
    }

    /// Spend part of an allowance to move tokens out of `from`
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<Event> {
        if from.is_zero() {
            return Err(TokenError::TransferFromZero);
        }
        if to.is_zero() {
            return Err(TokenError::TransferToZero);
        }

        let current_allowance = self.allowance(from, spender);
        if current_allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: current_allowance,
                need: amount,
            });
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        self.move_balance(from, to, amount);
        if let Some(allowance) = self
            .allowances
            .get_mut(from)
            .and_then(|spenders| spenders.get_mut(spender))
        {
            *allowance -= amount;
        }

        Ok(Event::Transfer {
            from: *from,
            to: *to,
            amount,
        })
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, to: &Address, amount: u128) -> TokenResult<Event> {
        if to.is_zero() {
            return Err(TokenError::MintToZero);
        }
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let new_supply =
            self.total_supply
                .checked_add(amount)
                .ok_or(TokenError::SupplyOverflow {
                    supply: self.total_supply,
                    amount,
                })?;

        self.total_supply = new_supply;
        *self.balances.entry(*to).or_insert(0) += amount;

        log::info!(
            "Minted {} {} to {} (supply {})",
            amount,
            self.metadata.symbol,
            to,
            self.total_supply
        );

        Ok(Event::Transfer {
            from: Address::ZERO,
            to: *to,
            amount,
        })
    }

    /// Destroy `amount` of `holder`'s tokens
    pub fn burn(&mut self, holder: &Address, amount: u128) -> TokenResult<Event> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let balance = self.balance_of(holder);
        if balance < amount {
            return Err(TokenError::InsufficientBurnBalance {
                have: balance,
                need: amount,
            });
        }

        *self.balances.entry(*holder).or_insert(0) -= amount;
        self.total_supply -= amount;

        log::info!(
            "Burned {} {} from {} (supply {})",
            amount,
            self.metadata.symbol,
            holder,
            self.total_supply
        );

        Ok(Event::Transfer {
            from: *holder,
            to: Address::ZERO,
            amount,
        })
    }

    /// Debit then credit. Caller has already checked the balance.
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) {
        *self.balances.entry(*from).or_insert(0) -= amount;
        *self.balances.entry(*to).or_insert(0) += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn create_test_ledger() -> Ledger {
        let metadata = TokenMetadata::new("Test Token".to_string(), "TST".to_string(), 18).unwrap();
        let mut ledger = Ledger::new(metadata);
        ledger.mint(&addr(1), 1_000_000).unwrap();
        ledger
    }

    #[test]
    fn test_ledger_creation() {
        let ledger = create_test_ledger();

        assert_eq!(ledger.name(), "Test Token");
        assert_eq!(ledger.symbol(), "TST");
        assert_eq!(ledger.decimals(), 18);
        assert_eq!(ledger.total_supply(), 1_000_000);
        assert_eq!(ledger.balance_of(&addr(1)), 1_000_000);
        assert_eq!(ledger.holder_count(), 1);
    }

    #[test]
    fn test_metadata_validation() {
        assert!(TokenMetadata::new("".to_string(), "TST".to_string(), 18).is_err());
        assert!(TokenMetadata::new("Test".to_string(), "TOOLONGSYMBOL".to_string(), 18).is_err());
        assert!(TokenMetadata::new("Test".to_string(), "TST".to_string(), 19).is_err());

        let metadata = TokenMetadata::new("Test".to_string(), "TST".to_string(), 2).unwrap();
        assert_eq!(metadata.unit(), 100);
    }

    #[test]
    fn test_transfer() {
        let mut ledger = create_test_ledger();

        let event = ledger.transfer(&addr(1), &addr(2), 1000).unwrap();

        assert_eq!(
            event,
            Event::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 1000
            }
        );
        assert_eq!(ledger.balance_of(&addr(1)), 999_000);
        assert_eq!(ledger.balance_of(&addr(2)), 1000);
        assert_eq!(ledger.holder_count(), 2);
        assert_eq!(ledger.sum_of_balances(), Some(ledger.total_supply()));
    }

    #[test]
    fn test_transfer_insufficient_balance_has_no_effect() {
        let mut ledger = create_test_ledger();

        let result = ledger.transfer(&addr(1), &addr(2), 2_000_000);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance {
                have: 1_000_000,
                need: 2_000_000
            })
        ));
        assert_eq!(ledger.balance_of(&addr(1)), 1_000_000);
        assert_eq!(ledger.balance_of(&addr(2)), 0);
    }

    #[test]
    fn test_transfer_to_zero_rejected() {
        let mut ledger = create_test_ledger();

        let result = ledger.transfer(&addr(1), &Address::ZERO, 10);
        assert_eq!(result, Err(TokenError::TransferToZero));
        assert_eq!(ledger.balance_of(&addr(1)), 1_000_000);
    }

    #[test]
    fn test_zero_and_self_transfers_allowed() {
        let mut ledger = create_test_ledger();

        ledger.transfer(&addr(1), &addr(2), 0).unwrap();
        ledger.transfer(&addr(1), &addr(1), 500).unwrap();

        assert_eq!(ledger.balance_of(&addr(1)), 1_000_000);
        assert_eq!(ledger.balance_of(&addr(2)), 0);
    }

    #[test]
    fn test_approve_and_allowance() {
        let mut ledger = create_test_ledger();

        assert_eq!(ledger.allowance(&addr(1), &addr(3)), 0);

        ledger.approve(&addr(1), &addr(3), 5000).unwrap();
        assert_eq!(ledger.allowance(&addr(1), &addr(3)), 5000);

        ledger.approve(&addr(1), &addr(3), 3000).unwrap();
        assert_eq!(ledger.allowance(&addr(1), &addr(3)), 3000);

        ledger.approve(&addr(1), &addr(3), 0).unwrap();
        assert_eq!(ledger.allowance(&addr(1), &addr(3)), 0);

        assert_eq!(
            ledger.approve(&addr(1), &Address::ZERO, 1),
            Err(TokenError::ApproveToZero)
        );
    }

    #[test]
    fn test_transfer_from() {
        let mut ledger = create_test_ledger();
        ledger.approve(&addr(1), &addr(3), 5000).unwrap();

        let event = ledger.transfer_from(&addr(3), &addr(1), &addr(2), 1000).unwrap();

        assert_eq!(
            event,
            Event::Transfer {
                from: addr(1),
                to: addr(2),
                amount: 1000
            }
        );
        assert_eq!(ledger.balance_of(&addr(1)), 999_000);
        assert_eq!(ledger.balance_of(&addr(2)), 1000);
        assert_eq!(ledger.allowance(&addr(1), &addr(3)), 4000);
    }

    #[test]
    fn test_transfer_from_insufficient_allowance() {
        let mut ledger = create_test_ledger();
        ledger.approve(&addr(1), &addr(3), 500).unwrap();

        let result = ledger.transfer_from(&addr(3), &addr(1), &addr(2), 501);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientAllowance { have: 500, need: 501 })
        ));
        assert_eq!(ledger.allowance(&addr(1), &addr(3)), 500);
        assert_eq!(ledger.balance_of(&addr(2)), 0);
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let mut ledger = create_test_ledger();
        ledger.approve(&addr(2), &addr(3), 500).unwrap();

        let result = ledger.transfer_from(&addr(3), &addr(2), &addr(4), 100);
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance(&addr(2), &addr(3)), 500);
    }

    #[test]
    fn test_mint_and_burn() {
        let mut ledger = create_test_ledger();

        let event = ledger.mint(&addr(2), 1000).unwrap();
        assert_eq!(
            event,
            Event::Transfer {
                from: Address::ZERO,
                to: addr(2),
                amount: 1000
            }
        );
        assert_eq!(ledger.total_supply(), 1_001_000);

        let event = ledger.burn(&addr(1), 1000).unwrap();
        assert_eq!(
            event,
            Event::Transfer {
                from: addr(1),
                to: Address::ZERO,
                amount: 1000
            }
        );
        assert_eq!(ledger.total_supply(), 1_000_000);
        assert_eq!(ledger.balance_of(&addr(1)), 999_000);
        assert_eq!(ledger.sum_of_balances(), Some(ledger.total_supply()));
    }

    #[test]
    fn test_mint_rejections() {
        let mut ledger = create_test_ledger();

        assert_eq!(ledger.mint(&Address::ZERO, 1), Err(TokenError::MintToZero));
        assert_eq!(ledger.mint(&addr(2), 0), Err(TokenError::InvalidAmount));
        assert!(matches!(
            ledger.mint(&addr(2), u128::MAX),
            Err(TokenError::SupplyOverflow { .. })
        ));
        assert_eq!(ledger.total_supply(), 1_000_000);
        assert_eq!(ledger.balance_of(&addr(2)), 0);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut ledger = create_test_ledger();

        let result = ledger.burn(&addr(2), 1000);
        assert_eq!(
            result,
            Err(TokenError::InsufficientBurnBalance { have: 0, need: 1000 })
        );
        assert_eq!(ledger.total_supply(), 1_000_000);
    }

    #[test]
    fn test_holders_sorted() {
        let mut ledger = create_test_ledger();
        ledger.transfer(&addr(1), &addr(2), 400_000).unwrap();
        ledger.transfer(&addr(1), &addr(3), 100).unwrap();

        let holders = ledger.holders();
        assert_eq!(holders[0], (addr(1), 599_900));
        assert_eq!(holders[1], (addr(2), 400_000));
        assert_eq!(holders[2], (addr(3), 100));
    }
}
