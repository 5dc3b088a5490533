//! Genesis configuration for the private token module.
//!
//! This module defines the initial state and configuration for the ledger
//! and auctions when the chain starts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use privtoken_crypto::SecretKey;
use privtoken_types::{sha256, Digest, Owner, ProofKind};

use crate::state::{EscrowAccounts, ModuleState};
use crate::verifier::AttestationVerifier;

/// Genesis configuration for the private token module.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModuleGenesisConfig {
    /// Identity allowed to issue public tokens after genesis
    #[serde(default)]
    pub admin: Option<Owner>,

    /// Escrow identities
    #[serde(default)]
    pub escrows: EscrowAccounts,

    /// Initial public balances
    #[serde(default)]
    pub initial_balances: Vec<BalanceConfig>,

    /// Assets minted at genesis, each in its owner's collection
    #[serde(default)]
    pub initial_assets: Vec<AssetConfig>,

    /// Public key whose signature makes a proof attestation valid
    #[serde(default)]
    pub attestor: Owner,

    /// Verifying key digest per circuit
    #[serde(default)]
    pub verifying_keys: Vec<VerifyingKeyConfig>,
}

/// Initial public balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceConfig {
    pub owner: Owner,
    pub amount: u64,
}

/// Asset minted at genesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetConfig {
    pub owner: Owner,
    pub metadata: Digest,
}

/// Verifying key registered for one circuit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyingKeyConfig {
    pub kind: ProofKind,
    pub vkey_hash: Digest,
}

/// Verifying key digests used by local development chains.
pub fn dev_verifying_keys() -> Vec<VerifyingKeyConfig> {
    ProofKind::ALL
        .iter()
        .map(|kind| {
            let mut seed = b"privtoken-dev-vkey:".to_vec();
            seed.push(kind.tag());
            VerifyingKeyConfig {
                kind: *kind,
                vkey_hash: sha256(&seed),
            }
        })
        .collect()
}

/// Attestor key of local development chains.
///
/// Derived from a public seed, so anyone can attest on a dev chain.
pub fn dev_attestor_key() -> SecretKey {
    SecretKey::from_seed(b"privtoken-dev-attestor")
}

impl ModuleGenesisConfig {
    /// Development genesis: default escrows, the dev attestor, every circuit
    /// registered.
    pub fn dev(admin: Owner) -> Self {
        Self {
            admin: Some(admin),
            attestor: dev_attestor_key().owner(),
            verifying_keys: dev_verifying_keys(),
            ..Default::default()
        }
    }

    /// Parse a JSON genesis file and validate it.
    pub fn from_json(json: &str) -> Result<Self, GenesisValidationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GenesisValidationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        let escrows = self.escrows.all();
        if escrows.iter().any(Owner::is_empty) {
            return Err(GenesisValidationError::InvalidEscrows(
                "Escrow identity cannot be empty".into(),
            ));
        }
        let unique: HashSet<_> = escrows.iter().collect();
        if unique.len() != escrows.len() {
            return Err(GenesisValidationError::InvalidEscrows(
                "Escrow identities must be distinct".into(),
            ));
        }

        if self.initial_balances.iter().any(|b| b.owner.is_empty())
            || self.initial_assets.iter().any(|a| a.owner.is_empty())
        {
            return Err(GenesisValidationError::EmptyOwner);
        }

        if !self.verifying_keys.is_empty() && self.attestor.is_empty() {
            return Err(GenesisValidationError::MissingAttestor);
        }

        let mut seen = HashSet::new();
        for key in &self.verifying_keys {
            if !seen.insert(key.kind) {
                return Err(GenesisValidationError::DuplicateVerifyingKey(key.kind));
            }
        }

        Ok(())
    }

    /// Build the initial module state.
    pub fn build_state(&self) -> Result<ModuleState, GenesisValidationError> {
        self.validate()?;

        let mut state = ModuleState::new(self.escrows.clone());
        state.admin = self.admin;
        for balance in &self.initial_balances {
            state
                .balances
                .mint(&balance.owner, balance.amount)
                .map_err(|_| GenesisValidationError::SupplyOverflow)?;
        }
        for asset in &self.initial_assets {
            state
                .assets
                .mint(&asset.owner, &asset.owner, asset.metadata)
                .map_err(|_| GenesisValidationError::SupplyOverflow)?;
        }

        Ok(state)
    }

    /// Build the proof verifier from the registered verifying keys.
    pub fn build_verifier(&self) -> AttestationVerifier {
        AttestationVerifier::new(
            self.attestor,
            self.verifying_keys.iter().map(|k| (k.kind, k.vkey_hash)),
        )
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid genesis file: {0}")]
    Parse(String),

    #[error("Invalid escrow configuration: {0}")]
    InvalidEscrows(String),

    #[error("Genesis entries cannot be owned by the empty identity")]
    EmptyOwner,

    #[error("Verifying keys are registered but no attestor is set")]
    MissingAttestor,

    #[error("Duplicate verifying key for {0:?}")]
    DuplicateVerifyingKey(ProofKind),

    #[error("Initial supply overflows")]
    SupplyOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::PublicLedger;

    #[test]
    fn test_default_config() {
        let config = ModuleGenesisConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dev_config_registers_every_circuit() {
        let config = ModuleGenesisConfig::dev(Owner([1u8; 48]));
        assert!(config.validate().is_ok());

        let verifier = config.build_verifier();
        assert_eq!(verifier.attestor(), &dev_attestor_key().owner());
        for kind in ProofKind::ALL {
            assert!(verifier.verifying_key(kind).is_some());
        }
    }

    #[test]
    fn test_circuits_require_attestor() {
        let mut config = ModuleGenesisConfig::dev(Owner([1u8; 48]));
        config.attestor = Owner::EMPTY;
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::MissingAttestor)
        ));
    }

    #[test]
    fn test_duplicate_escrows() {
        let mut config = ModuleGenesisConfig::default();
        config.escrows.withdraw = config.escrows.deposit;
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidEscrows(_))
        ));
    }

    #[test]
    fn test_empty_escrow() {
        let mut config = ModuleGenesisConfig::default();
        config.escrows.english_auction = Owner::EMPTY;
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidEscrows(_))
        ));
    }

    #[test]
    fn test_duplicate_verifying_key() {
        let mut config = ModuleGenesisConfig {
            attestor: dev_attestor_key().owner(),
            ..Default::default()
        };
        for byte in [1u8, 2] {
            config.verifying_keys.push(VerifyingKeyConfig {
                kind: ProofKind::Claim,
                vkey_hash: Digest([byte; 32]),
            });
        }
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::DuplicateVerifyingKey(ProofKind::Claim))
        ));
    }

    #[test]
    fn test_build_state_from_json() {
        let alice = Owner([0xa1; 48]);
        let config = ModuleGenesisConfig {
            admin: Some(alice),
            initial_balances: vec![BalanceConfig {
                owner: alice,
                amount: 1_000,
            }],
            initial_assets: vec![AssetConfig {
                owner: alice,
                metadata: Digest([3u8; 32]),
            }],
            attestor: dev_attestor_key().owner(),
            verifying_keys: vec![VerifyingKeyConfig {
                kind: ProofKind::Transfer,
                vkey_hash: Digest([9u8; 32]),
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();

        let parsed = ModuleGenesisConfig::from_json(&json).unwrap();
        let state = parsed.build_state().unwrap();

        assert_eq!(state.admin, Some(alice));
        assert_eq!(state.balances.balance_of(&alice), 1_000);
        assert_eq!(state.balances.circulating_supply(), 1_000);
        let asset = privtoken_types::AssetKey::new(alice, 0);
        assert_eq!(state.assets.get(&asset).unwrap().owner, alice);
        assert_eq!(
            parsed.build_verifier().verifying_key(ProofKind::Transfer),
            Some(&Digest([9u8; 32]))
        );
        assert_eq!(parsed.attestor, dev_attestor_key().owner());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ModuleGenesisConfig::from_json("{not json"),
            Err(GenesisValidationError::Parse(_))
        ));
    }
}
