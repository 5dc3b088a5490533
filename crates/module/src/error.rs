//! Module error types.
//!
//! Every variant is a transaction rejection: the runtime discards all writes
//! of the failed call and reports the reason to the sender.

use thiserror::Error;

use privtoken_types::{AssetKey, ProofKind};

use crate::verifier::ProofRejection;

/// Errors that can occur in the runtime module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("Invalid {kind:?} proof: {reason}")]
    InvalidProof {
        kind: ProofKind,
        reason: ProofRejection,
    },

    // === Auction lifecycle ===
    #[error("Caller is not the owner of the asset")]
    NotOwner,

    #[error("Asset is locked")]
    AlreadyLocked,

    #[error("Winner cannot be empty")]
    EmptyWinner,

    #[error("Asset not found: {0:?}")]
    AssetNotFound(AssetKey),

    // === Confidential ledger ===
    #[error("Proven encrypted balance does not match current known encrypted balance")]
    StaleBalance,

    #[error("Claim amount does not match proof amount")]
    ClaimMismatch,

    #[error("Claim recipient does not match proof owner")]
    NotClaimRecipient,

    #[error("Not first time: owner already has a balance")]
    NotFirstTime,

    #[error("Nullifier already used")]
    NullifierReused,

    #[error("Deposit root is not a known deposit log root")]
    UnknownDepositRoot,

    #[error("Wrong recipient")]
    WrongRecipient,

    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    // === Auctions ===
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("No auction exists for asset {0:?}")]
    NoAuctionForAsset(AssetKey),

    #[error("Invalid timing configuration")]
    InvalidTiming,

    #[error("Invalid price curve")]
    InvalidPriceCurve,

    #[error("Bidding period ended")]
    BiddingEnded,

    #[error("Wrong auction escrow")]
    WrongAuction,

    #[error("Bid commitment already used")]
    DuplicateBid,

    #[error("Outside reveal window")]
    OutsideRevealWindow,

    #[error("Bid commitment does not exist")]
    UnknownCommitment,

    #[error("Bid must be higher than the current best bid")]
    BidTooLow,

    #[error("Auction has ended")]
    AuctionEnded,

    #[error("Wait till auction ends")]
    TooEarly,

    #[error("Already settled")]
    AlreadySettled,

    // === Admin ===
    #[error("Not authorized")]
    NotAuthorized,

    #[error("Arithmetic overflow")]
    Overflow,
}
