//! Schnorr signatures over BLS12-381 G1.
//!
//! The signer holds `sk` with public key `P = sk·G`. For a message `m`:
//!
//! 1. Derive a nonce `k = H(sk, m)` and commit `R = k·G`
//! 2. Compute the challenge `c = H(R, P, m)`
//! 3. Respond with `s = k + c·sk`
//!
//! The signature is `R || s`. It verifies when `s·G == R + c·P`.

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use sha2::{Digest, Sha512};

use privtoken_types::Owner;

use crate::error::CryptoError;
use crate::keys::{decompress_g1, SecretKey};

const NONCE_DOMAIN: &[u8] = b"PRIVTOKEN-SCHNORR-NONCE-V1";
const CHALLENGE_DOMAIN: &[u8] = b"PRIVTOKEN-SCHNORR-CHALLENGE-V1";

/// Compressed `R` followed by the canonical bytes of `s`.
pub const SIGNATURE_LEN: usize = 48 + 32;

/// Sign `message` with `secret`.
///
/// The nonce is derived from the key and the message, so signing needs no
/// randomness and never reuses a nonce across messages.
pub fn sign(secret: &SecretKey, message: &[u8]) -> [u8; SIGNATURE_LEN] {
    let k = hash_to_scalar(&[NONCE_DOMAIN, secret.to_bytes().as_slice(), message]);
    let r = (G1Projective::generator() * k).to_affine();
    let public = secret.owner();

    let c = challenge(&r, &public, message);
    let s = k + c * secret.0;

    let mut signature = [0u8; SIGNATURE_LEN];
    signature[..48].copy_from_slice(&r.to_compressed());
    signature[48..].copy_from_slice(&s.to_bytes());
    signature
}

/// Verify a signature by `public` over `message`.
pub fn verify_signature(public: &Owner, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature);
    }
    let public_point = decompress_g1(&public.0)?;
    if bool::from(public_point.is_identity()) {
        return Err(CryptoError::IdentityKey);
    }

    let mut r_bytes = [0u8; 48];
    r_bytes.copy_from_slice(&signature[..48]);
    let r = decompress_g1(&r_bytes)?;

    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&signature[48..]);
    let s = Option::<Scalar>::from(Scalar::from_bytes(&s_bytes)).ok_or(CryptoError::InvalidScalar)?;

    let c = challenge(&r, public, message);
    let lhs = G1Projective::generator() * s;
    let rhs = G1Projective::from(r) + G1Projective::from(public_point) * c;
    if lhs != rhs {
        return Err(CryptoError::InvalidSignature);
    }
    Ok(())
}

fn challenge(r: &G1Affine, public: &Owner, message: &[u8]) -> Scalar {
    hash_to_scalar(&[CHALLENGE_DOMAIN, r.to_compressed().as_slice(), public.0.as_slice(), message])
}

/// SHA-512 over length-prefixed parts, reduced modulo the group order.
fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_wide(&wide)
}
