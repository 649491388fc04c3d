//! Account identities
//!
//! Identities are 20-byte addresses rendered as `0x`-prefixed lowercase hex,
//! the same shape as EVM account addresses. The all-zero address is
//! the null identity: it never holds a role and never receives tokens.

use crate::crypto::sha256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Errors raised while parsing an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("Address must be {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Address is not valid hex: {0}")]
    InvalidHex(String),
}

/// A ledger identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The null identity (`0x000...0`)
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Build an address from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive an address from arbitrary seed data.
    ///
    /// Takes the last 20 bytes of SHA-256(seed). Used for the contract's own
    /// address and for human-friendly test accounts.
    pub fn derive(seed: &[u8]) -> Self {
        let hash = sha256(seed);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[hash.len() - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    /// Whether this is the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Hex string with `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LENGTH * 2,
                got: digits.len(),
            });
        }

        let decoded = hex::decode(digits).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let text = "0x00112233445566778899aabbccddeeff00112233";
        let address: Address = text.parse().unwrap();

        assert_eq!(address.to_string(), text);
        assert_eq!(address.to_hex(), text);
        assert!(!address.is_zero());
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let address: Address = "0xAABBCCDDEEFF00112233445566778899AABBCCDD".parse().unwrap();
        assert_eq!(
            address.to_string(),
            "0xaabbccddeeff00112233445566778899aabbccdd"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "00112233445566778899aabbccddeeff00112233".parse::<Address>(),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength { got: 4, .. })
        ));
        assert!(matches!(
            "0xzz112233445566778899aabbccddeeff00112233".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(Address::default(), Address::ZERO);
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Address::derive(b"alice");
        let b = Address::derive(b"alice");
        let c = Address::derive(b"bob");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_zero());
    }

    #[test]
    fn test_serde_as_string() {
        let address = Address::new([7u8; ADDRESS_LENGTH]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);

        assert!(serde_json::from_str::<Address>("\"not-an-address\"").is_err());
    }
}
