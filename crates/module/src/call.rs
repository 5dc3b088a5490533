//! Call message types for the private token module.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use privtoken_types::{
    AssetKey, ClaimKey, ClaimOutput, DepositHashOutput, DepositOutput, Digest, Owner, Proof,
    RevealBidOutput, SealedBidOutput, TransferOutput, WithdrawOutput,
};

/// Call messages for the private token module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum RuntimeCall {
    // === Confidential Ledger ===
    /// Move an encrypted amount to another owner as a pending claim.
    Transfer { proof: Proof<TransferOutput> },

    /// Create the caller's ledger entry from a pending claim.
    AddFirstClaim {
        claim_key: ClaimKey,
        proof: Proof<ClaimOutput>,
    },

    /// Fold a pending claim into an existing ledger entry.
    AddClaim {
        claim_key: ClaimKey,
        proof: Proof<ClaimOutput>,
    },

    /// Lock public tokens and publish a deposit commitment.
    Deposit { proof: Proof<DepositHashOutput> },

    /// Redeem a logged deposit as a confidential claim.
    AddDeposit { proof: Proof<DepositOutput> },

    /// Convert confidential balance back into public tokens.
    Withdraw { proof: Proof<WithdrawOutput> },

    // === Sealed Bid Auction ===
    StartSealedBid {
        asset: AssetKey,
        bidding_window: u64,
        reveal_window: u64,
        min_price: u64,
    },

    PlaceSealedBid {
        asset: AssetKey,
        proof: Proof<SealedBidOutput>,
    },

    RevealBid { proof: Proof<RevealBidOutput> },

    /// Settle after the reveal window (permissionless).
    SettleSealedBid { asset: AssetKey },

    // === English Auction ===
    StartEnglish { asset: AssetKey, end_time: u64 },

    PlaceEnglishBid { asset: AssetKey, price: u64 },

    EndEnglish { asset: AssetKey },

    // === Dutch Auction ===
    StartDutch {
        asset: AssetKey,
        start_price: u64,
        decay_rate: u64,
        min_price: u64,
    },

    DutchBid { auction_id: u64 },

    // === Assets and Public Tokens ===
    MintAsset { to: Owner, metadata: Digest },

    TransferAsset { to: Owner, asset: AssetKey },

    TransferPublic { to: Owner, amount: u64 },

    // === Admin ===
    /// Issue public tokens.
    SetBalance { owner: Owner, amount: u64 },
}

impl RuntimeCall {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeCall::Transfer { .. } => "transfer",
            RuntimeCall::AddFirstClaim { .. } => "add_first_claim",
            RuntimeCall::AddClaim { .. } => "add_claim",
            RuntimeCall::Deposit { .. } => "deposit",
            RuntimeCall::AddDeposit { .. } => "add_deposit",
            RuntimeCall::Withdraw { .. } => "withdraw",
            RuntimeCall::StartSealedBid { .. } => "start_sealed_bid",
            RuntimeCall::PlaceSealedBid { .. } => "place_sealed_bid",
            RuntimeCall::RevealBid { .. } => "reveal_bid",
            RuntimeCall::SettleSealedBid { .. } => "settle_sealed_bid",
            RuntimeCall::StartEnglish { .. } => "start_english",
            RuntimeCall::PlaceEnglishBid { .. } => "place_english_bid",
            RuntimeCall::EndEnglish { .. } => "end_english",
            RuntimeCall::StartDutch { .. } => "start_dutch",
            RuntimeCall::DutchBid { .. } => "dutch_bid",
            RuntimeCall::MintAsset { .. } => "mint_asset",
            RuntimeCall::TransferAsset { .. } => "transfer_asset",
            RuntimeCall::TransferPublic { .. } => "transfer_public",
            RuntimeCall::SetBalance { .. } => "set_balance",
        }
    }
}
