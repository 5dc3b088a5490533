//! Commitment primitives.
//!
//! Every digest is SHA-256 over a domain tag followed by fixed-width fields,
//! so values from different contexts can never collide.

use sha2::{Digest as _, Sha256};

use crate::{Digest, Owner, ProofKind, Salt};

/// Root of the empty deposit log.
pub const DEPOSIT_LOG_GENESIS: Digest = Digest([0u8; 32]);

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}

/// Deposit commitment `H(amount, salt)`, published when public tokens are deposited.
pub fn deposit_commitment(amount: u64, salt: &Salt) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"PRIVTOKEN_DEPOSIT_V1:");
    hasher.update(amount.to_le_bytes());
    hasher.update(salt.0);
    Digest(hasher.finalize().into())
}

/// Nullifier `H(salt)`, recorded when a deposit is redeemed.
pub fn nullifier(salt: &Salt) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"PRIVTOKEN_NULLIFIER_V1:");
    hasher.update(salt.0);
    Digest(hasher.finalize().into())
}

/// Sealed bid commitment `H(auction_id, amount, bidder, salt)`.
pub fn bid_commitment(auction_id: u64, amount: u64, bidder: &Owner, salt: &Salt) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"PRIVTOKEN_SEALED_BID_V1:");
    hasher.update(auction_id.to_le_bytes());
    hasher.update(amount.to_le_bytes());
    hasher.update(bidder.0);
    hasher.update(salt.0);
    Digest(hasher.finalize().into())
}

/// Advance the deposit log accumulator by one entry.
///
/// `root' = H(root, index, commitment)`
pub fn deposit_log_step(root: &Digest, index: u64, commitment: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"PRIVTOKEN_DEPOSIT_LOG_V1:");
    hasher.update(root.0);
    hasher.update(index.to_le_bytes());
    hasher.update(commitment.0);
    Digest(hasher.finalize().into())
}

/// Attestation binding a public output to the circuit and verification key.
///
/// `H(kind, vkey_hash, output)`
pub fn proof_attestation(kind: ProofKind, vkey_hash: &Digest, encoded_output: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(b"PRIVTOKEN_ATTESTATION_V1:");
    hasher.update([kind.tag()]);
    hasher.update(vkey_hash.0);
    hasher.update(encoded_output);
    Digest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_commitment_binds_amount_and_salt() {
        let salt = Salt([1u8; 32]);
        let c1 = deposit_commitment(100, &salt);
        let c2 = deposit_commitment(101, &salt);
        let c3 = deposit_commitment(100, &Salt([2u8; 32]));

        assert_eq!(c1, deposit_commitment(100, &salt));
        assert_ne!(c1, c2);
        assert_ne!(c1, c3);
    }

    #[test]
    fn test_nullifier_is_domain_separated() {
        let salt = Salt([9u8; 32]);
        assert_ne!(nullifier(&salt), sha256(&salt.0));
        assert_ne!(nullifier(&salt), deposit_commitment(0, &salt));
    }

    #[test]
    fn test_bid_commitment_binds_every_field() {
        let bidder = Owner([3u8; 48]);
        let salt = Salt([4u8; 32]);
        let base = bid_commitment(1, 500, &bidder, &salt);

        assert_ne!(base, bid_commitment(2, 500, &bidder, &salt));
        assert_ne!(base, bid_commitment(1, 400, &bidder, &salt));
        assert_ne!(base, bid_commitment(1, 500, &Owner([5u8; 48]), &salt));
        assert_ne!(base, bid_commitment(1, 500, &bidder, &Salt([6u8; 32])));
    }

    #[test]
    fn test_deposit_log_order_matters() {
        let a = sha256(b"a");
        let b = sha256(b"b");

        let ab = deposit_log_step(&deposit_log_step(&DEPOSIT_LOG_GENESIS, 0, &a), 1, &b);
        let ba = deposit_log_step(&deposit_log_step(&DEPOSIT_LOG_GENESIS, 0, &b), 1, &a);

        assert_ne!(ab, ba);
    }

    #[test]
    fn test_attestation_binds_kind_and_key() {
        let vkey = Digest([4u8; 32]);
        let a = proof_attestation(ProofKind::Transfer, &vkey, b"out");
        assert_ne!(a, proof_attestation(ProofKind::Claim, &vkey, b"out"));
        assert_ne!(a, proof_attestation(ProofKind::Transfer, &Digest([5u8; 32]), b"out"));
        assert_ne!(a, proof_attestation(ProofKind::Transfer, &vkey, b"out2"));
    }
}
