//! Query handlers for the private token module.
//!
//! These functions provide read-only access to module state.

use serde::{Deserialize, Serialize};

use privtoken_types::{AssetKey, AssetRecord, ClaimKey, Digest, EncryptedAmount, Owner};

use crate::balances::PublicLedger;
use crate::records::{BidCommitment, DutchAuction, EnglishAuction, SealedBidAuction, SealedBidPhase};
use crate::state::ModuleState;

/// Auction variant selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionKind {
    SealedBid,
    English,
    Dutch,
}

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ModuleQuery {
    /// Encrypted ledger balance of an owner.
    GetLedger { owner: Owner },

    /// Pending (or consumed) claim.
    GetClaim { claim_key: ClaimKey },

    /// Next claim index for a recipient.
    GetClaimNonce { recipient: Owner },

    /// Deposit commitment at a log index.
    GetDeposit { index: u64 },

    /// Every deposit commitment in log order.
    ListDeposits,

    /// Deposit log length and current root.
    GetDepositLog,

    /// Whether a nullifier has been spent.
    IsNullifierUsed { nullifier: Digest },

    /// State of a sealed bid commitment.
    GetBidCommitment { bid_hash: Digest },

    /// Public balance.
    GetBalance { owner: Owner },

    GetAsset { asset: AssetKey },

    GetSealedBidAuction { auction_id: u64 },

    GetEnglishAuction { auction_id: u64 },

    GetDutchAuction { auction_id: u64 },

    /// Latest auction of a variant for an asset.
    GetAuctionId { kind: AuctionKind, asset: AssetKey },

    /// Sealed bid auctions that can be settled at `height`.
    ListSettleable { height: u64 },
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleQueryResponse {
    Ledger(Option<EncryptedAmount>),

    Claim(Option<EncryptedAmount>),

    ClaimNonce(u64),

    Deposit(Option<Digest>),

    Deposits(Vec<Digest>),

    DepositLog { nonce: u64, root: Digest },

    NullifierUsed(bool),

    /// `None` if never placed.
    BidCommitment(Option<BidCommitment>),

    Balance(u64),

    Asset(Option<AssetRecord>),

    SealedBidAuction(Option<SealedBidAuction>),

    EnglishAuction(Option<EnglishAuction>),

    DutchAuction(Option<DutchAuction>),

    AuctionId(Option<u64>),

    AuctionIds(Vec<u64>),
}

/// Handle a query.
pub fn handle_query(state: &ModuleState, query: ModuleQuery) -> ModuleQueryResponse {
    let token = &state.private_token;
    match query {
        ModuleQuery::GetLedger { owner } => {
            ModuleQueryResponse::Ledger(token.ledger.get(&owner).copied())
        }

        ModuleQuery::GetClaim { claim_key } => {
            ModuleQueryResponse::Claim(token.claims.get(&claim_key).copied())
        }

        ModuleQuery::GetClaimNonce { recipient } => {
            ModuleQueryResponse::ClaimNonce(token.nonces.get(&recipient).copied().unwrap_or(0))
        }

        ModuleQuery::GetDeposit { index } => {
            ModuleQueryResponse::Deposit(token.deposits.get(&index).copied())
        }

        ModuleQuery::ListDeposits => {
            ModuleQueryResponse::Deposits(token.deposits.values().copied().collect())
        }

        ModuleQuery::GetDepositLog => ModuleQueryResponse::DepositLog {
            nonce: token.deposit_nonce,
            root: token.deposit_root,
        },

        ModuleQuery::IsNullifierUsed { nullifier } => {
            ModuleQueryResponse::NullifierUsed(token.nullifiers.contains(&nullifier))
        }

        ModuleQuery::GetBidCommitment { bid_hash } => {
            ModuleQueryResponse::BidCommitment(state.bid_commitments.get(&bid_hash).copied())
        }

        ModuleQuery::GetBalance { owner } => {
            ModuleQueryResponse::Balance(state.balances.balance_of(&owner))
        }

        ModuleQuery::GetAsset { asset } => {
            ModuleQueryResponse::Asset(state.assets.get(&asset).cloned())
        }

        ModuleQuery::GetSealedBidAuction { auction_id } => {
            ModuleQueryResponse::SealedBidAuction(state.sealed_bid.records.get(&auction_id).cloned())
        }

        ModuleQuery::GetEnglishAuction { auction_id } => {
            ModuleQueryResponse::EnglishAuction(state.english.records.get(&auction_id).cloned())
        }

        ModuleQuery::GetDutchAuction { auction_id } => {
            ModuleQueryResponse::DutchAuction(state.dutch.records.get(&auction_id).cloned())
        }

        ModuleQuery::GetAuctionId { kind, asset } => {
            let ids = match kind {
                AuctionKind::SealedBid => &state.sealed_bid.auction_ids,
                AuctionKind::English => &state.english.auction_ids,
                AuctionKind::Dutch => &state.dutch.auction_ids,
            };
            ModuleQueryResponse::AuctionId(ids.get(&asset).copied())
        }

        ModuleQuery::ListSettleable { height } => {
            ModuleQueryResponse::AuctionIds(get_settleable_auctions(state, height))
        }
    }
}

/// Get sealed bid auctions currently accepting bids.
pub fn get_open_auctions(state: &ModuleState, height: u64) -> Vec<u64> {
    sealed_bid_in_phase(state, height, SealedBidPhase::Bidding)
}

/// Get sealed bid auctions currently accepting reveals.
pub fn get_revealing_auctions(state: &ModuleState, height: u64) -> Vec<u64> {
    sealed_bid_in_phase(state, height, SealedBidPhase::Revealing)
}

/// Get sealed bid auctions past their reveal window and not yet settled.
pub fn get_settleable_auctions(state: &ModuleState, height: u64) -> Vec<u64> {
    sealed_bid_in_phase(state, height, SealedBidPhase::AwaitingSettlement)
}

fn sealed_bid_in_phase(state: &ModuleState, height: u64, phase: SealedBidPhase) -> Vec<u64> {
    state
        .sealed_bid
        .records
        .iter()
        .filter(|(_, auction)| auction.phase(height) == phase)
        .map(|(id, _)| *id)
        .collect()
}
