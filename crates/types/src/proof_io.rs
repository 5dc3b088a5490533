//! Proof envelopes and the public outputs each circuit attests to.
//!
//! The runtime never sees private inputs. It receives a proof together with
//! its public output and, once the proof verifies, treats the output as
//! established fact.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Digest, EncryptedAmount, Owner};

/// The circuits whose proofs the runtime consumes.
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
pub enum ProofKind {
    Transfer,
    Claim,
    DepositHash,
    Deposit,
    Withdraw,
    SealedBid,
    RevealBid,
}

impl ProofKind {
    pub const ALL: [ProofKind; 7] = [
        ProofKind::Transfer,
        ProofKind::Claim,
        ProofKind::DepositHash,
        ProofKind::Deposit,
        ProofKind::Withdraw,
        ProofKind::SealedBid,
        ProofKind::RevealBid,
    ];

    /// Stable one-byte tag used when hashing.
    pub fn tag(&self) -> u8 {
        match self {
            ProofKind::Transfer => 1,
            ProofKind::Claim => 2,
            ProofKind::DepositHash => 3,
            ProofKind::Deposit => 4,
            ProofKind::Withdraw => 5,
            ProofKind::SealedBid => 6,
            ProofKind::RevealBid => 7,
        }
    }
}

/// A public output record tied to exactly one circuit.
pub trait PublicOutput: BorshSerialize + Clone {
    const KIND: ProofKind;

    /// Canonical encoding the proof attests to.
    fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }
}

/// A proof plus the public output it claims.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Proof<O> {
    /// Digest of the verification key the proof was generated against
    pub vkey_hash: Digest,
    /// Serialized proof
    pub proof_bytes: Vec<u8>,
    /// Public output of the circuit
    pub public_output: O,
}

/// `current == resulting + amount`, `amount` encrypted to `to`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TransferOutput {
    pub owner: Owner,
    pub to: Owner,
    pub current_balance: EncryptedAmount,
    pub resulting_balance: EncryptedAmount,
    pub amount: EncryptedAmount,
}

impl PublicOutput for TransferOutput {
    const KIND: ProofKind = ProofKind::Transfer;
}

/// `current + amount == resulting`, all encrypted to `owner`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ClaimOutput {
    pub owner: Owner,
    pub current_balance: EncryptedAmount,
    pub resulting_balance: EncryptedAmount,
    pub amount: EncryptedAmount,
}

impl PublicOutput for ClaimOutput {
    const KIND: ProofKind = ProofKind::Claim;
}

/// `deposit_hash == H(amount, salt)`; `amount` is public.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DepositHashOutput {
    pub amount: u64,
    pub deposit_hash: Digest,
}

impl PublicOutput for DepositHashOutput {
    const KIND: ProofKind = ProofKind::DepositHash;
}

/// `H(amount, salt)` is in the deposit log with accumulator `root_hash`,
/// `nullifier_hash == H(salt)` and `amount` is encrypted to `to`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct DepositOutput {
    pub root_hash: Digest,
    pub nullifier_hash: Digest,
    pub to: Owner,
    pub amount: EncryptedAmount,
}

impl PublicOutput for DepositOutput {
    const KIND: ProofKind = ProofKind::Deposit;
}

/// `current == resulting + amount` with a plaintext `amount`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct WithdrawOutput {
    pub owner: Owner,
    pub to: Owner,
    pub current_balance: EncryptedAmount,
    pub resulting_balance: EncryptedAmount,
    pub amount: u64,
}

impl PublicOutput for WithdrawOutput {
    const KIND: ProofKind = ProofKind::Withdraw;
}

/// `current == resulting + amount`, `bid_hash == H(auction_id, amount, owner, salt)`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SealedBidOutput {
    pub owner: Owner,
    pub to: Owner,
    /// Auction the bid hash commits to
    pub auction_id: u64,
    pub current_balance: EncryptedAmount,
    pub resulting_balance: EncryptedAmount,
    pub bid_hash: Digest,
}

impl PublicOutput for SealedBidOutput {
    const KIND: ProofKind = ProofKind::SealedBid;
}

/// `bid_hash == H(auction_id, amount, bidder, salt)`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealBidOutput {
    pub auction_id: u64,
    pub amount: u64,
    pub bidder: Owner,
    pub bid_hash: Digest,
}

impl PublicOutput for RevealBidOutput {
    const KIND: ProofKind = ProofKind::RevealBid;
}
