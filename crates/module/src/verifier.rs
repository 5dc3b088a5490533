//! Proof verification boundary.
//!
//! Handlers never read a public output before it has been checked against
//! the verifying key registered for its circuit. [`verify_proof`] is the only
//! way to obtain a [`Verified`] output.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use privtoken_crypto::verify_signature;
use privtoken_types::{proof_attestation, Digest, Owner, Proof, ProofKind, PublicOutput};

use crate::error::ModuleError;
use crate::handlers::HandlerResult;

/// Why a proof was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProofRejection {
    #[error("no verifying key registered for circuit")]
    UnknownCircuit,

    #[error("verifying key does not match the registered key")]
    VerifyingKeyMismatch,

    #[error("proof does not attest to the public output")]
    BadProof,
}

/// Checks a serialized proof against a public output.
pub trait ProofVerifier {
    fn verify(
        &self,
        kind: ProofKind,
        vkey_hash: &Digest,
        proof_bytes: &[u8],
        public_output: &[u8],
    ) -> Result<(), ProofRejection>;
}

/// Public output whose proof has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<O>(O);

impl<O> Verified<O> {
    pub fn output(&self) -> &O {
        &self.0
    }

    pub fn into_inner(self) -> O {
        self.0
    }
}

/// Verify `proof` for its circuit and release the public output.
pub fn verify_proof<O: PublicOutput>(
    verifier: &dyn ProofVerifier,
    proof: &Proof<O>,
) -> HandlerResult<Verified<O>> {
    let encoded = proof.public_output.encode();
    verifier
        .verify(O::KIND, &proof.vkey_hash, &proof.proof_bytes, &encoded)
        .map_err(|reason| {
            debug!(kind = ?O::KIND, %reason, "proof rejected");
            ModuleError::InvalidProof {
                kind: O::KIND,
                reason,
            }
        })?;

    Ok(Verified(proof.public_output.clone()))
}

/// Verifier for attestation proofs.
///
/// A proof is accepted when it was produced against the registered verifying
/// key and its bytes are the attestor's signature over
/// `H(kind, vkey_hash, output)`. The attestor only signs after checking every
/// circuit constraint on the private inputs.
#[derive(Debug, Clone)]
pub struct AttestationVerifier {
    attestor: Owner,
    verifying_keys: HashMap<ProofKind, Digest>,
}

impl Default for AttestationVerifier {
    fn default() -> Self {
        Self::new(Owner::EMPTY, [])
    }
}

impl AttestationVerifier {
    pub fn new(
        attestor: Owner,
        verifying_keys: impl IntoIterator<Item = (ProofKind, Digest)>,
    ) -> Self {
        Self {
            attestor,
            verifying_keys: verifying_keys.into_iter().collect(),
        }
    }

    pub fn attestor(&self) -> &Owner {
        &self.attestor
    }

    pub fn verifying_key(&self, kind: ProofKind) -> Option<&Digest> {
        self.verifying_keys.get(&kind)
    }
}

impl ProofVerifier for AttestationVerifier {
    fn verify(
        &self,
        kind: ProofKind,
        vkey_hash: &Digest,
        proof_bytes: &[u8],
        public_output: &[u8],
    ) -> Result<(), ProofRejection> {
        let registered = self
            .verifying_keys
            .get(&kind)
            .ok_or(ProofRejection::UnknownCircuit)?;
        if registered != vkey_hash {
            return Err(ProofRejection::VerifyingKeyMismatch);
        }

        let attestation = proof_attestation(kind, vkey_hash, public_output);
        verify_signature(&self.attestor, &attestation.0, proof_bytes)
            .map_err(|_| ProofRejection::BadProof)
    }
}
