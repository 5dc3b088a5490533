//! Error types for keys, amount encryption and signatures.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid G1 point encoding")]
    InvalidG1Point,

    #[error("Invalid scalar encoding")]
    InvalidScalar,

    #[error("Recipient key is the identity point")]
    IdentityKey,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Key derivation failed")]
    KeyDerivationFailed,

    #[error("Invalid signature")]
    InvalidSignature,
}
