//! Deployment configuration
//!
//! Defaults reproduce the production deployment: "Forty Two Token" (F42T),
//! 18 decimals, 42 million whole tokens, 2 required signatures.

use crate::core::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default initial supply in whole tokens
pub const DEFAULT_INITIAL_SUPPLY: u128 = 42_000_000;

/// Default number of required confirmations
pub const DEFAULT_REQUIRED_SIGNATURES: usize = 2;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Parameters for deploying a token
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Initial supply in whole tokens; scaled by `10^decimals` at deployment
    pub initial_supply: u128,
    /// Multisig signers. Duplicates are dropped at deployment.
    pub signers: Vec<Address>,
    /// Required confirmations, clamped to the number of unique signers
    pub required_signatures: usize,
    /// Keep the owner's direct `mint` path alongside multisig minting
    pub owner_mint_enabled: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Forty Two Token".to_string(),
            symbol: "F42T".to_string(),
            decimals: 18,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
            signers: Vec::new(),
            required_signatures: DEFAULT_REQUIRED_SIGNATURES,
            owner_mint_enabled: false,
        }
    }
}

impl TokenConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Signers with duplicates removed (first occurrence wins) and the
    /// required count clamped to how many remain.
    pub fn effective_signers(&self) -> (Vec<Address>, usize) {
        let mut unique: Vec<Address> = Vec::with_capacity(self.signers.len());
        for signer in &self.signers {
            if !unique.contains(signer) {
                unique.push(*signer);
            }
        }

        let required = self.required_signatures.min(unique.len());
        (unique, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_defaults() {
        let config = TokenConfig::default();

        assert_eq!(config.name, "Forty Two Token");
        assert_eq!(config.symbol, "F42T");
        assert_eq!(config.decimals, 18);
        assert_eq!(config.initial_supply, 42_000_000);
        assert_eq!(config.required_signatures, 2);
        assert!(!config.owner_mint_enabled);
    }

    #[test]
    fn test_effective_signers_dedup_and_clamp() {
        let config = TokenConfig {
            signers: vec![addr(1), addr(1), addr(1)],
            ..Default::default()
        };
        assert_eq!(config.effective_signers(), (vec![addr(1)], 1));

        let config = TokenConfig {
            signers: vec![addr(2), addr(1), addr(2), addr(3)],
            required_signatures: 2,
            ..Default::default()
        };
        assert_eq!(config.effective_signers(), (vec![addr(2), addr(1), addr(3)], 2));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("token.json");
        std::fs::write(
            &path,
            r#"{"initial_supply": 1000, "signers": ["0x0101010101010101010101010101010101010101"]}"#,
        )
        .unwrap();

        let config = TokenConfig::from_file(&path).unwrap();
        assert_eq!(config.initial_supply, 1000);
        assert_eq!(config.signers, vec![addr(1)]);
        assert_eq!(config.symbol, "F42T");
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("token.json");

        let config = TokenConfig {
            signers: vec![addr(1), addr(2)],
            owner_mint_enabled: true,
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(TokenConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            TokenConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            TokenConfig::from_file(&temp_dir.path().join("missing.json")),
            Err(ConfigError::IoError(_))
        ));
    }
}
