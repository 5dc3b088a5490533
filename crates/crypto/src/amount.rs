//! Amount encryption to a single recipient key.
//!
//! # Encryption
//!
//! To encrypt `amount` to recipient `P = sk·G`:
//! 1. Sample random scalar r
//! 2. Compute E = r·G (ephemeral key) and S = r·P (shared point)
//! 3. Derive an AES key with HKDF-SHA256 over S || E
//! 4. Encrypt the little-endian amount with AES-256-GCM
//!
//! # Decryption
//!
//! The recipient computes S = sk·E and reverses step 3 and 4.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use bls12_381::{G1Projective, Scalar};
use group::Curve;
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use privtoken_types::{EncryptedAmount, Owner};

use crate::error::CryptoError;
use crate::keys::{decompress_g1, SecretKey};

const KDF_INFO: &[u8] = b"PRIVTOKEN-AMOUNT-KEY-V1";

/// Encrypt an amount so only the holder of `recipient`'s secret key can read it.
pub fn encrypt_amount<R: RngCore + CryptoRng>(
    recipient: &Owner,
    amount: u64,
    rng: &mut R,
) -> Result<EncryptedAmount, CryptoError> {
    let recipient_point = decompress_g1(&recipient.0)?;
    if bool::from(recipient_point.is_identity()) {
        return Err(CryptoError::IdentityKey);
    }

    let r = random_scalar(rng);
    let ephemeral = (G1Projective::generator() * r).to_affine();
    let shared = (G1Projective::from(recipient_point) * r).to_affine();

    let ephemeral_key = ephemeral.to_compressed();
    let key = derive_key(&shared.to_compressed(), &ephemeral_key)?;

    let mut nonce = [0u8; 12];
    rng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| CryptoError::EncryptionFailed(format!("Failed to create cipher: {}", e)))?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), amount.to_le_bytes().as_ref())
        .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM encryption failed: {}", e)))?;

    // 8 bytes of ciphertext followed by the 16 byte tag
    let mut ciphertext = [0u8; 8];
    ciphertext.copy_from_slice(&sealed[..8]);
    let mut tag = [0u8; 16];
    tag.copy_from_slice(&sealed[8..]);

    Ok(EncryptedAmount {
        ephemeral_key,
        ciphertext,
        tag,
        nonce,
    })
}

/// Decrypt an amount with the recipient's secret key.
pub fn decrypt_amount(secret: &SecretKey, encrypted: &EncryptedAmount) -> Result<u64, CryptoError> {
    let ephemeral = decompress_g1(&encrypted.ephemeral_key)?;
    let shared = (G1Projective::from(ephemeral) * secret.0).to_affine();
    let key = derive_key(&shared.to_compressed(), &encrypted.ephemeral_key)?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::KeyDerivationFailed)?;

    let mut sealed = Vec::with_capacity(24);
    sealed.extend_from_slice(&encrypted.ciphertext);
    sealed.extend_from_slice(&encrypted.tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&encrypted.nonce), sealed.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let bytes: [u8; 8] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::AuthenticationFailed)?;
    Ok(u64::from_le_bytes(bytes))
}

fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    Scalar::from_bytes_wide(&bytes)
}

fn derive_key(shared: &[u8; 48], ephemeral: &[u8; 48]) -> Result<[u8; 32], CryptoError> {
    let mut ikm = [0u8; 96];
    ikm[..48].copy_from_slice(shared);
    ikm[48..].copy_from_slice(ephemeral);

    let hk = Hkdf::<Sha256>::new(None, &ikm);
    let mut key = [0u8; 32];
    hk.expand(KDF_INFO, &mut key)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;
    Ok(key)
}
