//! Authorized signer set and approval threshold
//!
//! The registry guarantees `1 <= threshold <= signer_count` after every
//! mutation. Mutators validate first and only then change state, so a
//! rejected call leaves the registry untouched.

use crate::core::{Address, Event, TokenError, TokenResult};
use crate::token::OwnershipRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The N signers and the M-of-N threshold
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignerRegistry {
    signers: BTreeSet<Address>,
    threshold: usize,
}

impl SignerRegistry {
    /// Create a registry from an initial signer list
    ///
    /// # Errors
    /// Rejects an empty list, the null identity, duplicates, a zero
    /// threshold, and a threshold larger than the signer count.
    pub fn new(signers: Vec<Address>, threshold: usize) -> TokenResult<Self> {
        if signers.is_empty() {
            return Err(TokenError::NoSigners);
        }

        let mut set = BTreeSet::new();
        for signer in signers {
            if signer.is_zero() {
                return Err(TokenError::ZeroSigner);
            }
            if !set.insert(signer) {
                return Err(TokenError::DuplicateSigner(signer));
            }
        }

        if threshold == 0 {
            return Err(TokenError::InvalidThreshold(threshold));
        }
        if threshold > set.len() {
            return Err(TokenError::ThresholdExceedsSigners {
                threshold,
                signers: set.len(),
            });
        }

        Ok(Self {
            signers: set,
            threshold,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn is_signer(&self, who: &Address) -> bool {
        self.signers.contains(who)
    }

    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    /// All signers in address order
    pub fn signers(&self) -> Vec<Address> {
        self.signers.iter().copied().collect()
    }

    /// Required confirmations (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Human-readable "M-of-N"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.signers.len())
    }

    /// Capability check for signer-only operations
    pub fn require_signer(&self, caller: &Address) -> TokenResult<()> {
        if self.is_signer(caller) {
            Ok(())
        } else {
            Err(TokenError::NotSigner(*caller))
        }
    }

    // =========================================================================
    // Controller-only mutations
    // =========================================================================

    pub fn add_signer(
        &mut self,
        caller: &Address,
        signer: &Address,
        ownership: &OwnershipRecord,
    ) -> TokenResult<Event> {
        ownership.require_owner(caller)?;

        if signer.is_zero() {
            return Err(TokenError::ZeroSigner);
        }
        if self.is_signer(signer) {
            return Err(TokenError::SignerAlreadyExists(*signer));
        }

        self.signers.insert(*signer);
        log::info!("Signer added: {} ({})", signer, self.description());

        Ok(Event::SignerAdded { signer: *signer })
    }

    pub fn remove_signer(
        &mut self,
        caller: &Address,
        signer: &Address,
        ownership: &OwnershipRecord,
    ) -> TokenResult<Event> {
        ownership.require_owner(caller)?;

        if !self.is_signer(signer) {
            return Err(TokenError::SignerNotFound(*signer));
        }

        let remaining = self.signers.len() - 1;
        if remaining < self.threshold {
            return Err(TokenError::ThresholdExceedsSigners {
                threshold: self.threshold,
                signers: remaining,
            });
        }

        self.signers.remove(signer);
        log::info!("Signer removed: {} ({})", signer, self.description());

        Ok(Event::SignerRemoved { signer: *signer })
    }

    pub fn set_threshold(
        &mut self,
        caller: &Address,
        threshold: usize,
        ownership: &OwnershipRecord,
    ) -> TokenResult<Event> {
        ownership.require_owner(caller)?;

        if threshold == 0 {
            return Err(TokenError::InvalidThreshold(threshold));
        }
        if threshold > self.signers.len() {
            return Err(TokenError::ThresholdExceedsSigners {
                threshold,
                signers: self.signers.len(),
            });
        }

        let old = std::mem::replace(&mut self.threshold, threshold);
        log::info!("Required signatures changed: {} -> {}", old, threshold);

        Ok(Event::RequiredSignaturesChanged {
            old,
            new: threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn owner() -> OwnershipRecord {
        OwnershipRecord::new(addr(100))
    }

    fn create_test_registry() -> SignerRegistry {
        SignerRegistry::new(vec![addr(1), addr(2), addr(3)], 2).unwrap()
    }

    fn assert_invariant(registry: &SignerRegistry) {
        assert!(registry.threshold() >= 1);
        assert!(registry.signer_count() >= registry.threshold());
    }

    #[test]
    fn test_registry_creation() {
        let registry = create_test_registry();

        assert_eq!(registry.threshold(), 2);
        assert_eq!(registry.signer_count(), 3);
        assert_eq!(registry.description(), "2-of-3");
        assert_eq!(registry.signers(), vec![addr(1), addr(2), addr(3)]);
        assert!(registry.is_signer(&addr(2)));
        assert!(!registry.is_signer(&addr(4)));
    }

    #[test]
    fn test_registry_validation() {
        assert_eq!(SignerRegistry::new(vec![], 1), Err(TokenError::NoSigners));
        assert_eq!(
            SignerRegistry::new(vec![addr(1)], 0),
            Err(TokenError::InvalidThreshold(0))
        );
        assert_eq!(
            SignerRegistry::new(vec![addr(1), addr(2)], 3),
            Err(TokenError::ThresholdExceedsSigners {
                threshold: 3,
                signers: 2
            })
        );
        assert_eq!(
            SignerRegistry::new(vec![addr(1), addr(1)], 1),
            Err(TokenError::DuplicateSigner(addr(1)))
        );
        assert_eq!(
            SignerRegistry::new(vec![addr(1), Address::ZERO], 1),
            Err(TokenError::ZeroSigner)
        );

        // A single signer with threshold 1 is a valid set
        assert!(SignerRegistry::new(vec![addr(1)], 1).is_ok());
    }

    #[test]
    fn test_add_signer() {
        let mut registry = create_test_registry();
        let ownership = owner();

        let event = registry.add_signer(&addr(100), &addr(4), &ownership).unwrap();
        assert_eq!(event, Event::SignerAdded { signer: addr(4) });
        assert_eq!(registry.signer_count(), 4);

        assert_eq!(
            registry.add_signer(&addr(100), &addr(4), &ownership),
            Err(TokenError::SignerAlreadyExists(addr(4)))
        );
        assert_eq!(
            registry.add_signer(&addr(100), &Address::ZERO, &ownership),
            Err(TokenError::ZeroSigner)
        );
        assert_eq!(registry.signer_count(), 4);
    }

    #[test]
    fn test_non_controller_rejected() {
        let mut registry = create_test_registry();
        let ownership = owner();

        let err = registry
            .add_signer(&addr(1), &addr(4), &ownership)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = registry
            .remove_signer(&addr(1), &addr(2), &ownership)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = registry.set_threshold(&addr(1), 1, &ownership).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        assert_eq!(registry, create_test_registry());
    }

    #[test]
    fn test_remove_down_to_threshold() {
        let mut registry = create_test_registry();
        let ownership = owner();

        registry.remove_signer(&addr(100), &addr(3), &ownership).unwrap();
        assert_eq!(registry.signer_count(), 2);
        assert_invariant(&registry);

        let err = registry
            .remove_signer(&addr(100), &addr(2), &ownership)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(registry.signer_count(), 2);
        assert!(registry.is_signer(&addr(2)));
    }

    #[test]
    fn test_remove_unknown_signer() {
        let mut registry = create_test_registry();

        let err = registry
            .remove_signer(&addr(100), &addr(9), &owner())
            .unwrap_err();
        assert_eq!(err, TokenError::SignerNotFound(addr(9)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_set_threshold() {
        let mut registry = create_test_registry();
        let ownership = owner();

        let event = registry.set_threshold(&addr(100), 3, &ownership).unwrap();
        assert_eq!(event, Event::RequiredSignaturesChanged { old: 2, new: 3 });
        assert_eq!(registry.threshold(), 3);

        let err = registry.set_threshold(&addr(100), 0, &ownership).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = registry.set_threshold(&addr(100), 4, &ownership).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);

        assert_eq!(registry.threshold(), 3);
        assert_invariant(&registry);
    }

    #[test]
    fn test_invariant_holds_across_mutation_sequence() {
        let mut registry = create_test_registry();
        let ownership = owner();
        let controller = addr(100);

        let _ = registry.add_signer(&controller, &addr(4), &ownership);
        assert_invariant(&registry);
        let _ = registry.set_threshold(&controller, 4, &ownership);
        assert_invariant(&registry);
        for n in 1..=4 {
            let _ = registry.remove_signer(&controller, &addr(n), &ownership);
            assert_invariant(&registry);
        }
        let _ = registry.set_threshold(&controller, 1, &ownership);
        for n in 1..=4 {
            let _ = registry.remove_signer(&controller, &addr(n), &ownership);
            assert_invariant(&registry);
        }
        assert_eq!(registry.signer_count(), 1);
    }
}
