//! Reference prover.
//!
//! Builds the public output each circuit would expose, checking every circuit
//! constraint on the private inputs first, and signs the attestation digest
//! with the attestor key registered at genesis. Inputs that violate a
//! constraint produce a [`ProverError`] instead of a proof.

use std::collections::HashMap;

use rand::{CryptoRng, RngCore};
use tracing::debug;

use privtoken_crypto::{decrypt_amount, encrypt_amount, sign, Keypair, SecretKey};
use privtoken_module::ModuleGenesisConfig;
use privtoken_types::{
    bid_commitment, deposit_commitment, nullifier, proof_attestation, ClaimOutput,
    DepositHashOutput, DepositOutput, Digest, EncryptedAmount, Owner, Proof, ProofKind,
    PublicOutput, RevealBidOutput, Salt, SealedBidOutput, TransferOutput, WithdrawOutput,
};

use crate::deposit_log::DepositLog;
use crate::error::ProverError;

pub type ProverResult<T> = Result<T, ProverError>;

/// Proves statements about a key holder's encrypted balance.
#[derive(Clone, Debug)]
pub struct Prover {
    attestor: SecretKey,
    verifying_keys: HashMap<ProofKind, Digest>,
}

/// A sealed bid proof together with the opening the bidder keeps until reveal.
#[derive(Clone, Debug)]
pub struct SealedBid {
    pub proof: Proof<SealedBidOutput>,
    pub auction_id: u64,
    pub amount: u64,
    pub salt: Salt,
}

impl SealedBid {
    pub fn bid_hash(&self) -> Digest {
        self.proof.public_output.bid_hash
    }

    /// Reveal proof for this bid.
    pub fn reveal(&self, prover: &Prover) -> ProverResult<Proof<RevealBidOutput>> {
        prover.prove_reveal(
            &self.proof.public_output.owner,
            self.auction_id,
            self.amount,
            &self.salt,
        )
    }
}

impl Prover {
    pub fn new(
        attestor: SecretKey,
        verifying_keys: impl IntoIterator<Item = (ProofKind, Digest)>,
    ) -> Self {
        Self {
            attestor,
            verifying_keys: verifying_keys.into_iter().collect(),
        }
    }

    /// Prover for the circuits of `config`, signing with `attestor`.
    pub fn from_genesis(config: &ModuleGenesisConfig, attestor: SecretKey) -> ProverResult<Self> {
        if attestor.owner() != config.attestor {
            return Err(ProverError::UnregisteredAttestor);
        }
        Ok(Self::new(
            attestor,
            config.verifying_keys.iter().map(|k| (k.kind, k.vkey_hash)),
        ))
    }

    /// Transfer `amount` from `owner`'s `current` balance to `to`.
    pub fn prove_transfer<R: RngCore + CryptoRng>(
        &self,
        owner: &Keypair,
        current: &EncryptedAmount,
        amount: u64,
        to: &Owner,
        rng: &mut R,
    ) -> ProverResult<Proof<TransferOutput>> {
        let remaining = spend(owner, current, amount)?;
        self.attest(TransferOutput {
            owner: owner.owner(),
            to: *to,
            current_balance: *current,
            resulting_balance: encrypt_amount(&owner.owner(), remaining, rng)?,
            amount: encrypt_amount(to, amount, rng)?,
        })
    }

    /// Fold `claim` into `current`, or open the first balance when `current` is `None`.
    pub fn prove_claim<R: RngCore + CryptoRng>(
        &self,
        owner: &Keypair,
        current: Option<&EncryptedAmount>,
        claim: &EncryptedAmount,
        rng: &mut R,
    ) -> ProverResult<Proof<ClaimOutput>> {
        if claim.is_empty() {
            return Err(ProverError::ConsumedClaim);
        }
        let claimed = decrypt_amount(owner.secret(), claim)?;

        let output = match current {
            None => ClaimOutput {
                owner: owner.owner(),
                current_balance: EncryptedAmount::empty(),
                resulting_balance: *claim,
                amount: *claim,
            },
            Some(current) => {
                let balance = decrypt_amount(owner.secret(), current)?;
                let total = balance.checked_add(claimed).ok_or(ProverError::Overflow)?;
                ClaimOutput {
                    owner: owner.owner(),
                    current_balance: *current,
                    resulting_balance: encrypt_amount(&owner.owner(), total, rng)?,
                    amount: *claim,
                }
            }
        };
        self.attest(output)
    }

    /// Commit to a public deposit of `amount`.
    pub fn prove_deposit_hash(&self, amount: u64, salt: &Salt) -> ProverResult<Proof<DepositHashOutput>> {
        self.attest(DepositHashOutput {
            amount,
            deposit_hash: deposit_commitment(amount, salt),
        })
    }

    /// Redeem a logged deposit as a claim for `to`.
    pub fn prove_deposit<R: RngCore + CryptoRng>(
        &self,
        log: &DepositLog,
        amount: u64,
        salt: &Salt,
        to: &Owner,
        rng: &mut R,
    ) -> ProverResult<Proof<DepositOutput>> {
        let witness = log
            .inclusion(&deposit_commitment(amount, salt))
            .ok_or(ProverError::CommitmentNotInLog)?;
        debug!(index = witness.index, "deposit inclusion found");

        self.attest(DepositOutput {
            root_hash: witness.root,
            nullifier_hash: nullifier(salt),
            to: *to,
            amount: encrypt_amount(to, amount, rng)?,
        })
    }

    /// Withdraw `amount` in public tokens to the withdraw escrow `to`.
    pub fn prove_withdraw<R: RngCore + CryptoRng>(
        &self,
        owner: &Keypair,
        current: &EncryptedAmount,
        amount: u64,
        to: &Owner,
        rng: &mut R,
    ) -> ProverResult<Proof<WithdrawOutput>> {
        let remaining = spend(owner, current, amount)?;
        self.attest(WithdrawOutput {
            owner: owner.owner(),
            to: *to,
            current_balance: *current,
            resulting_balance: encrypt_amount(&owner.owner(), remaining, rng)?,
            amount,
        })
    }

    /// Escrow a hidden bid of `amount` for `auction_id` with the auction escrow `to`.
    pub fn prove_sealed_bid<R: RngCore + CryptoRng>(
        &self,
        owner: &Keypair,
        current: &EncryptedAmount,
        auction_id: u64,
        amount: u64,
        to: &Owner,
        rng: &mut R,
    ) -> ProverResult<SealedBid> {
        let remaining = spend(owner, current, amount)?;
        let mut salt = Salt([0u8; 32]);
        rng.fill_bytes(&mut salt.0);

        let proof = self.attest(SealedBidOutput {
            owner: owner.owner(),
            to: *to,
            auction_id,
            current_balance: *current,
            resulting_balance: encrypt_amount(&owner.owner(), remaining, rng)?,
            bid_hash: bid_commitment(auction_id, amount, &owner.owner(), &salt),
        })?;
        Ok(SealedBid {
            proof,
            auction_id,
            amount,
            salt,
        })
    }

    /// Open a sealed bid of `amount` for `auction_id`.
    pub fn prove_reveal(
        &self,
        bidder: &Owner,
        auction_id: u64,
        amount: u64,
        salt: &Salt,
    ) -> ProverResult<Proof<RevealBidOutput>> {
        self.attest(RevealBidOutput {
            auction_id,
            amount,
            bidder: *bidder,
            bid_hash: bid_commitment(auction_id, amount, bidder, salt),
        })
    }

    fn attest<O: PublicOutput>(&self, output: O) -> ProverResult<Proof<O>> {
        let vkey_hash = *self
            .verifying_keys
            .get(&O::KIND)
            .ok_or(ProverError::MissingVerifyingKey(O::KIND))?;
        let attestation = proof_attestation(O::KIND, &vkey_hash, &output.encode());

        Ok(Proof {
            vkey_hash,
            proof_bytes: sign(&self.attestor, &attestation.0).to_vec(),
            public_output: output,
        })
    }
}

/// Decrypt `current` and return what remains after spending `amount`.
fn spend(owner: &Keypair, current: &EncryptedAmount, amount: u64) -> ProverResult<u64> {
    let balance = decrypt_amount(owner.secret(), current)?;
    balance
        .checked_sub(amount)
        .ok_or(ProverError::InsufficientBalance { balance, amount })
}
