//! Owner keypairs on BLS12-381 G1.

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use privtoken_types::Owner;

use crate::error::CryptoError;

/// Secret scalar of an owner.
#[derive(Clone)]
pub struct SecretKey(pub(crate) Scalar);

impl SecretKey {
    /// Sample a uniformly random secret key.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 64];
        rng.fill_bytes(&mut bytes);
        Self(Scalar::from_bytes_wide(&bytes))
    }

    /// Derive a secret key from seed bytes.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&Sha512::digest(seed));
        Self(Scalar::from_bytes_wide(&wide))
    }

    /// Decode a canonical little-endian scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        Option::<Scalar>::from(Scalar::from_bytes(bytes))
            .map(Self)
            .ok_or(CryptoError::InvalidScalar)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// The public identity `sk·G1`.
    pub fn owner(&self) -> Owner {
        compress_g1(&(G1Projective::generator() * self.0).to_affine())
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A secret key together with its public identity.
#[derive(Clone, Debug)]
pub struct Keypair {
    secret: SecretKey,
    owner: Owner,
}

impl Keypair {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(SecretKey::random(rng))
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        let owner = secret.owner();
        Self { secret, owner }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

/// Compress a G1 point into an owner identity.
pub fn compress_g1(point: &G1Affine) -> Owner {
    Owner(point.to_compressed())
}

/// Decompress an owner identity into a G1 point.
pub fn decompress_g1(bytes: &[u8; 48]) -> Result<G1Affine, CryptoError> {
    Option::<G1Affine>::from(G1Affine::from_compressed(bytes)).ok_or(CryptoError::InvalidG1Point)
}
