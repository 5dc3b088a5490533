//! Fixtures shared by handler tests.

use privtoken_crypto::{sign, SecretKey};
use privtoken_types::{
    proof_attestation, AssetKey, Digest, EncryptedAmount, Owner, Proof, ProofKind, PublicOutput,
};

use super::CallContext;
use crate::state::ModuleState;
use crate::verifier::AttestationVerifier;

pub const ALICE: Owner = Owner([0xa1; 48]);
pub const BOB: Owner = Owner([0xb0; 48]);
pub const CAROL: Owner = Owner([0xc0; 48]);

pub fn vkey(kind: ProofKind) -> Digest {
    Digest([kind.tag(); 32])
}

pub fn attestor() -> SecretKey {
    SecretKey::from_seed(b"handler test attestor")
}

pub fn verifier() -> AttestationVerifier {
    AttestationVerifier::new(
        attestor().owner(),
        ProofKind::ALL.iter().map(|kind| (*kind, vkey(*kind))),
    )
}

/// Attest `output` the way the reference prover does.
pub fn attest<O: PublicOutput>(output: O) -> Proof<O> {
    let vkey_hash = vkey(O::KIND);
    let digest = proof_attestation(O::KIND, &vkey_hash, &output.encode());
    Proof {
        vkey_hash,
        proof_bytes: sign(&attestor(), &digest.0).to_vec(),
        public_output: output,
    }
}

/// Distinct stand-in ciphertext; handlers only compare them.
pub fn enc(marker: u8) -> EncryptedAmount {
    EncryptedAmount {
        ephemeral_key: [marker; 48],
        ciphertext: [marker; 8],
        tag: [marker; 16],
        nonce: [marker; 12],
    }
}

pub fn ctx(sender: Owner, block_height: u64) -> CallContext {
    CallContext {
        sender,
        block_height,
    }
}

/// State where `owner` holds a freshly minted, unlocked asset.
pub fn state_with_asset(owner: Owner) -> (ModuleState, AssetKey) {
    let mut state = ModuleState::default();
    let asset = state
        .assets
        .mint(&owner, &owner, Digest([7u8; 32]))
        .unwrap();
    (state, asset)
}
