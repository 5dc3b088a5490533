//! Key holder tooling for confidential amounts.
//!
//! The runtime treats an [`EncryptedAmount`](privtoken_types::EncryptedAmount)
//! as an opaque value. Everything that needs the plaintext lives here and runs
//! off-chain, on behalf of whoever holds the decryption key:
//!
//! 1. **Keys**: an owner's identity is `sk·G1` on BLS12-381.
//! 2. **Encryption**: an amount is encrypted to a recipient key with an
//!    ephemeral Diffie-Hellman exchange, HKDF and AES-256-GCM.
//! 3. **Decryption**: the recipient recomputes the shared point with `sk`.
//! 4. **Signatures**: Schnorr signatures under the same keys, used by the
//!    proof attestor.

pub mod amount;
pub mod error;
pub mod keys;
pub mod signature;

pub use amount::{decrypt_amount, encrypt_amount};
pub use error::CryptoError;
pub use keys::{Keypair, SecretKey};
pub use signature::{sign, verify_signature, SIGNATURE_LEN};
