use thiserror::Error;

use privtoken_crypto::CryptoError;
use privtoken_types::ProofKind;

/// Errors that can occur while building a proof.
///
/// Each variant other than `Crypto`, `MissingVerifyingKey` and
/// `UnregisteredAttestor` is a violated circuit constraint: no valid proof
/// exists for those inputs.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("No verifying key for {0:?}")]
    MissingVerifyingKey(ProofKind),

    #[error("Attestor key is not the one registered at genesis")]
    UnregisteredAttestor,

    #[error("Insufficient balance: have {balance}, need {amount}")]
    InsufficientBalance { balance: u64, amount: u64 },

    #[error("Balance overflow")]
    Overflow,

    #[error("Deposit commitment is not in the deposit log")]
    CommitmentNotInLog,

    #[error("Claim is already consumed")]
    ConsumedClaim,
}
