//! Core type definitions for the private token platform.
//!
//! This crate provides the data model shared by the runtime module, the
//! off-chain key holder tooling and the reference prover: identities,
//! opaque encrypted amounts, claim and asset keys, proof envelopes and the
//! hash commitments that bind hidden values.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub mod commitment;
pub mod proof_io;

pub use commitment::{
    bid_commitment, deposit_commitment, deposit_log_step, nullifier, proof_attestation, sha256,
    DEPOSIT_LOG_GENESIS,
};
pub use proof_io::{
    ClaimOutput, DepositHashOutput, DepositOutput, Proof, ProofKind, PublicOutput, RevealBidOutput,
    SealedBidOutput, TransferOutput, WithdrawOutput,
};

// =========================
// IDENTITIES
// =========================

/// Public identity: a compressed BLS12-381 G1 verification key (48 bytes).
///
/// The all-zero encoding is not a valid point and is used as the "empty"
/// identity, e.g. for an auction that has no winner yet.
#[serde_as]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Owner(#[serde_as(as = "[_; 48]")] pub [u8; 48]);

impl Owner {
    pub const EMPTY: Owner = Owner([0u8; 48]);

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 48]
    }

    /// Parse an owner from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
        let bytes: [u8; 48] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({})", self)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<empty>");
        }
        write!(f, "0x{}..", hex::encode(&self.0[..6]))
    }
}

/// 32-byte SHA-256 digest used for commitments, nullifiers and roots.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Digest(pub [u8; 32]);

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x{})", hex::encode(&self.0[..8]))
    }
}

/// Secret randomness chosen by a depositor or bidder.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Salt(pub [u8; 32]);

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(<redacted>)")
    }
}

// =========================
// CONFIDENTIAL AMOUNTS
// =========================

/// An amount encrypted to one recipient's key.
///
/// The runtime never decrypts or adds these; it only compares encodings.
/// Two encryptions of the same plaintext are different values.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EncryptedAmount {
    /// Ephemeral public key `r·G` (compressed G1)
    #[serde_as(as = "[_; 48]")]
    pub ephemeral_key: [u8; 48],
    /// AES-GCM encryption of the little-endian amount
    pub ciphertext: [u8; 8],
    pub tag: [u8; 16],
    pub nonce: [u8; 12],
}

impl EncryptedAmount {
    /// Sentinel written over a consumed claim.
    pub const fn empty() -> Self {
        Self {
            ephemeral_key: [0u8; 48],
            ciphertext: [0u8; 8],
            tag: [0u8; 16],
            nonce: [0u8; 12],
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Representation identity. Says nothing about the plaintexts.
    pub fn encodes_same_ciphertext_as(&self, other: &EncryptedAmount) -> bool {
        self == other
    }
}

impl Default for EncryptedAmount {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for EncryptedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("EncryptedAmount(<empty>)");
        }
        write!(
            f,
            "EncryptedAmount(0x{}..)",
            hex::encode(&self.ephemeral_key[..6])
        )
    }
}

// =========================
// KEYS
// =========================

/// Key of a pending credit: `(recipient, index)`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct ClaimKey {
    pub recipient: Owner,
    pub index: u64,
}

impl ClaimKey {
    pub fn new(recipient: Owner, index: u64) -> Self {
        Self { recipient, index }
    }
}

/// Key of a non-fungible asset: the minting collection plus its sequence number.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct AssetKey {
    pub collection: Owner,
    pub sequence: u32,
}

impl AssetKey {
    pub fn new(collection: Owner, sequence: u32) -> Self {
        Self {
            collection,
            sequence,
        }
    }
}

/// A non-fungible asset record.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AssetRecord {
    pub owner: Owner,
    /// Opaque metadata, e.g. a content hash
    pub metadata: Digest,
    pub locked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_empty() {
        assert!(Owner::EMPTY.is_empty());
        assert!(Owner::default().is_empty());
        assert!(!Owner([1u8; 48]).is_empty());
    }

    #[test]
    fn test_owner_hex() {
        let owner = Owner([0xab; 48]);
        let parsed = Owner::from_hex(&format!("0x{}", owner.to_hex())).unwrap();
        assert_eq!(owner, parsed);
        assert!(Owner::from_hex("abcd").is_none());
    }

    #[test]
    fn test_encrypted_amount_sentinel() {
        let empty = EncryptedAmount::empty();
        assert!(empty.is_empty());

        let mut other = EncryptedAmount::empty();
        other.nonce[0] = 1;
        assert!(!other.is_empty());
        assert!(!other.encodes_same_ciphertext_as(&empty));
        assert!(other.encodes_same_ciphertext_as(&other));
    }

    #[test]
    fn test_salt_debug_redacted() {
        let salt = Salt([7u8; 32]);
        assert_eq!(format!("{:?}", salt), "Salt(<redacted>)");
    }
}
